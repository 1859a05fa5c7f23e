use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use concierge_models::{AgentKind, PortfolioProfile, ResearchConfig};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};
use crate::openai::OpenAiChat;
use crate::parser::strip_reasoning;
use crate::prompts::strategist_system_prompt;
use crate::specialist::SpecialistAgent;

/// Market intelligence from an external research service, framed by the
/// client's portfolio profile.
pub struct MarketResearcher {
    profile: PortfolioProfile,
    llm: Option<Arc<dyn ChatModel>>,
    credential_env: String,
}

impl MarketResearcher {
    /// `llm` is `None` when the research credential is missing; every answer
    /// then reports the missing variable instead of calling out.
    pub fn new(
        profile: PortfolioProfile,
        llm: Option<Arc<dyn ChatModel>>,
        credential_env: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            llm,
            credential_env: credential_env.into(),
        }
    }

    /// Build the research client from the credential in the environment.
    /// An unset or blank variable counts as missing.
    pub fn from_env(profile: PortfolioProfile, config: &ResearchConfig) -> Result<Self, AgentError> {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());

        let llm = match key {
            Some(key) => {
                let chat = OpenAiChat::new(
                    "research",
                    config.base_url.as_str(),
                    key,
                    config.model.as_str(),
                    0.0,
                    Duration::from_secs(config.timeout_seconds),
                )?;
                Some(Arc::new(chat) as Arc<dyn ChatModel>)
            }
            None => {
                warn!(env = %config.api_key_env, "Research credential missing");
                None
            }
        };

        Ok(Self::new(profile, llm, config.api_key_env.as_str()))
    }

    pub fn profile(&self) -> &PortfolioProfile {
        &self.profile
    }
}

#[async_trait]
impl SpecialistAgent for MarketResearcher {
    fn name(&self) -> &str {
        "researcher"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Researcher
    }

    async fn answer(&self, question: &str) -> Result<String, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(format!(
                "Error: {}",
                AgentError::MissingCredential(self.credential_env.clone())
            ));
        };

        let system = strategist_system_prompt(question, &self.profile.render());
        debug!(client = %self.profile.client, backend = llm.name(), "Requesting market research");
        let reply = llm.complete(&ChatRequest::new(system, question)).await?;
        Ok(strip_reasoning(&reply))
    }
}
