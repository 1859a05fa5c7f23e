use async_trait::async_trait;

use crate::error::AgentError;

/// One chat completion: system instructions plus user content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Ask the backend to constrain output to a JSON object, where supported.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// A hosted chat model. Mockable for testing.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifies the backend in logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError>;
}
