use std::sync::Arc;

use async_trait::async_trait;
use concierge_data::{Embedder, SemanticIndex};
use concierge_models::{AgentKind, RetrievalConfig};
use tracing::debug;

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts::lawyer_system_prompt;
use crate::specialist::SpecialistAgent;

/// Retrieval-augmented answers over one client's legal documents.
pub struct DocumentLawyer {
    llm: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    index: Arc<SemanticIndex>,
    top_k: usize,
    fetch_k: usize,
    mmr_lambda: f32,
}

impl DocumentLawyer {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<SemanticIndex>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            llm,
            embedder,
            index,
            top_k: retrieval.top_k,
            fetch_k: retrieval.fetch_k,
            mmr_lambda: retrieval.mmr_lambda,
        }
    }

    /// Retrieved chunk texts joined into one context block.
    pub async fn context_for(&self, question: &str) -> Result<String, AgentError> {
        let chunks = self
            .index
            .retrieve(
                question,
                self.embedder.as_ref(),
                self.top_k,
                self.fetch_k,
                self.mmr_lambda,
            )
            .await?;
        debug!(
            retrieved = chunks.len(),
            sources = ?chunks.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
            "Retrieved document context"
        );
        Ok(chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[async_trait]
impl SpecialistAgent for DocumentLawyer {
    fn name(&self) -> &str {
        "lawyer"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Lawyer
    }

    async fn answer(&self, question: &str) -> Result<String, AgentError> {
        let context = self.context_for(question).await?;
        let request = ChatRequest::new(lawyer_system_prompt(&context), question);
        let reply = self.llm.complete(&request).await?;
        Ok(reply.trim().to_string())
    }
}
