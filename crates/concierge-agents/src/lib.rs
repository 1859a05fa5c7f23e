pub mod analyst;
pub mod claude_cli;
pub mod error;
pub mod lawyer;
pub mod llm;
pub mod openai;
pub mod parser;
pub mod prompts;
pub mod researcher;
pub mod router;
pub mod specialist;

pub mod test_support;

pub use analyst::{FilterSpec, PortfolioAnalyst, QueryPlan};
pub use claude_cli::ClaudeCli;
pub use error::AgentError;
pub use lawyer::DocumentLawyer;
pub use llm::{ChatModel, ChatRequest};
pub use openai::{OpenAiChat, OpenAiEmbedder};
pub use researcher::MarketResearcher;
pub use router::{IntentRouter, Specialists};
pub use specialist::SpecialistAgent;
