use std::sync::Arc;

use anyhow::Result;
use concierge_agents::parser::strip_reasoning;
use concierge_agents::IntentRouter;
use concierge_models::{ConversationTurn, RouteResult};
use tracing::info;
use uuid::Uuid;

use crate::Concierge;

/// One conversation with one selected client.
///
/// History is append-only until the client changes or the session is reset.
pub struct Session {
    id: Uuid,
    concierge: Arc<Concierge>,
    client: String,
    router: IntentRouter,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub async fn start(concierge: Arc<Concierge>, client: &str) -> Result<Self> {
        let router = concierge.router_for(client).await?;
        let id = Uuid::new_v4();
        info!(session = %id, client = %client, "Session started");
        Ok(Self {
            id,
            concierge,
            client: client.to_string(),
            router,
            history: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Route one question and record both sides of the exchange.
    pub async fn ask(&mut self, question: &str) -> RouteResult {
        self.history.push(ConversationTurn::user(question));
        let result = self.router.route_and_execute(question).await;
        self.history
            .push(ConversationTurn::assistant(strip_reasoning(&result.render())));
        result
    }

    /// Select a different client. The old history does not carry over.
    pub async fn switch_client(&mut self, client: &str) -> Result<()> {
        self.router = self.concierge.router_for(client).await?;
        info!(session = %self.id, from = %self.client, to = %client, "Switched client");
        self.client = client.to_string();
        self.history.clear();
        Ok(())
    }

    /// Rebuild the client's portfolio view and document index from disk,
    /// keeping the conversation.
    pub async fn reload(&mut self) -> Result<()> {
        self.concierge.forget(&self.client).await;
        self.router = self.concierge.router_for(&self.client).await?;
        info!(session = %self.id, client = %self.client, "Reloaded client data");
        Ok(())
    }

    pub fn reset(&mut self) {
        info!(session = %self.id, turns = self.history.len(), "Session reset");
        self.history.clear();
    }
}
