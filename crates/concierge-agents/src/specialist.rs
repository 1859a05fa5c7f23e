use async_trait::async_trait;
use concierge_models::AgentKind;

use crate::error::AgentError;

/// One collaborator the router can dispatch a question to. Mockable for testing.
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    /// Lowercase name used in log fields and error prefixes.
    fn name(&self) -> &str;

    fn kind(&self) -> AgentKind;

    /// Answer a question verbatim as asked by the user.
    async fn answer(&self, question: &str) -> Result<String, AgentError>;
}
