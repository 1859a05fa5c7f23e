//! Wealth Concierge - a family-office chat assistant.
//!
//! Questions about one client are classified and answered by a portfolio
//! analyst, a document lawyer or a market researcher, or by combining the
//! data and market answers for compound questions.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use concierge::{Concierge, Session};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = concierge::load_config("config/concierge.toml")?;
//! let concierge = Arc::new(Concierge::from_config(config)?);
//! let mut session = Session::start(concierge, "Wayne").await?;
//! let answer = session.ask("How much cash do I have?").await;
//! println!("{}", answer.render());
//! # Ok(())
//! # }
//! ```

pub use concierge_agents as agents;
pub use concierge_data as data;
pub use concierge_models as models;

pub mod session;

pub use session::Session;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use concierge_agents::claude_cli::ClaudeCliConfig;
use concierge_agents::{
    AgentError, ChatModel, ClaudeCli, DocumentLawyer, IntentRouter, MarketResearcher, OpenAiChat,
    OpenAiEmbedder, PortfolioAnalyst, Specialists,
};
use concierge_data::{ClientCache, Embedder, PortfolioStore};
use concierge_models::config::{ChatBackend, ConciergeConfig, DataConfig, LlmConfig, RetrievalConfig};
use concierge_models::PortfolioProfile;
use tracing::info;

/// Read and parse a TOML configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConciergeConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Distinct client identifiers in the dataset, in file order.
pub fn list_clients(data: &DataConfig) -> Result<Vec<String>> {
    let store = PortfolioStore::load(&data.portfolio_path)
        .with_context(|| format!("Failed to load portfolio: {}", data.portfolio_path))?;
    Ok(store.clients())
}

/// Portfolio summary for one client, read straight from the dataset.
pub fn portfolio_profile(data: &DataConfig, client: &str) -> Result<PortfolioProfile> {
    let store = PortfolioStore::load(&data.portfolio_path)
        .with_context(|| format!("Failed to load portfolio: {}", data.portfolio_path))?;
    Ok(store.for_client(client).profile())
}

fn api_key(env: &str) -> Result<String, AgentError> {
    std::env::var(env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AgentError::MissingCredential(env.to_string()))
}

/// Construct the configured chat backend.
pub fn build_chat(llm: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    let timeout = Duration::from_secs(llm.timeout_seconds);
    let chat: Arc<dyn ChatModel> = match llm.backend {
        ChatBackend::Openai => {
            let key = api_key(&llm.api_key_env).context("Chat backend unavailable")?;
            Arc::new(OpenAiChat::new(
                "openai",
                llm.base_url.as_str(),
                key,
                llm.model.as_str(),
                llm.temperature,
                timeout,
            )?)
        }
        ChatBackend::ClaudeCli => Arc::new(ClaudeCli::new(ClaudeCliConfig {
            model: llm.model.clone(),
            timeout,
        })),
    };
    Ok(chat)
}

pub fn build_embedder(retrieval: &RetrievalConfig) -> Result<Arc<dyn Embedder>> {
    let key = api_key(&retrieval.api_key_env).context("Embedding service unavailable")?;
    Ok(Arc::new(OpenAiEmbedder::new(
        retrieval.base_url.as_str(),
        key,
        retrieval.embedding_model.as_str(),
        Duration::from_secs(retrieval.timeout_seconds),
    )?))
}

/// Shared services for every session: the chat backend and the per-client
/// state cache.
pub struct Concierge {
    config: ConciergeConfig,
    chat: Arc<dyn ChatModel>,
    cache: ClientCache,
}

impl Concierge {
    pub fn from_config(config: ConciergeConfig) -> Result<Self> {
        let chat = build_chat(&config.llm)?;
        let embedder = build_embedder(&config.retrieval)?;
        info!(backend = chat.name(), model = %config.llm.model, "Concierge ready");
        Ok(Self::with_backends(config, chat, embedder))
    }

    /// Use explicit backends instead of the configured services.
    pub fn with_backends(
        config: ConciergeConfig,
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let cache = ClientCache::new(
            config.data.clone(),
            config.retrieval.clone(),
            &config.cache,
            embedder,
        );
        Self {
            config,
            chat,
            cache,
        }
    }

    pub fn config(&self) -> &ConciergeConfig {
        &self.config
    }

    /// Wire a router over the client's cached state.
    pub async fn router_for(&self, client: &str) -> Result<IntentRouter> {
        let state = self
            .cache
            .get(client)
            .await
            .with_context(|| format!("Failed to load client {client}"))?;

        let researcher =
            MarketResearcher::from_env(state.portfolio.profile(), &self.config.research)?;
        let specialists = Specialists {
            analyst: Arc::new(PortfolioAnalyst::new(
                Arc::clone(&self.chat),
                Arc::clone(&state.portfolio),
            )),
            lawyer: Arc::new(DocumentLawyer::new(
                Arc::clone(&self.chat),
                self.cache.embedder(),
                Arc::clone(&state.index),
                &self.config.retrieval,
            )),
            researcher: Arc::new(researcher),
        };

        Ok(IntentRouter::new(
            Arc::clone(&self.chat),
            specialists,
            Arc::clone(&state.portfolio),
            self.config.router.clone(),
        ))
    }

    /// Drop the client's cached state so the next session rebuilds it.
    pub async fn forget(&self, client: &str) {
        self.cache.invalidate(client).await;
    }
}
