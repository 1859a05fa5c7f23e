pub mod agent_message;
pub mod config;
pub mod conversation;
pub mod portfolio;

pub use agent_message::{AgentKind, Route, RouteResult};
pub use config::{
    CacheConfig, ChatBackend, ConciergeConfig, DataConfig, LlmConfig, ResearchConfig,
    RetrievalConfig, RouterConfig,
};
pub use conversation::{ConversationTurn, Role};
pub use portfolio::{format_usd, AssetAllocation, PortfolioProfile, PortfolioRow, RowFilter};
