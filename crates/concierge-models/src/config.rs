use serde::{Deserialize, Serialize};

/// Top-level configuration for the concierge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConciergeConfig {
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub research: ResearchConfig,
    pub retrieval: RetrievalConfig,
    pub router: RouterConfig,
}

/// Where client data lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// CSV with Family, Asset_Name, Asset_Class, Value_USD and Liquidity columns.
    pub portfolio_path: String,
    /// Parent of the per-client document directories (`<dir>/<client lowercase>/*.txt`).
    pub documents_dir: String,
    /// Client whose documents are used when a client has none of its own.
    pub default_client: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            portfolio_path: "data/portfolio.csv".to_string(),
            documents_dir: "data/legal_docs".to_string(),
            default_client: "Wayne".to_string(),
        }
    }
}

/// Per-client state cache (filtered portfolio + semantic index).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of clients kept warm.
    pub max_clients: u64,
    /// Seconds before a client's state is rebuilt regardless of file changes.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_clients: 16,
            ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatBackend {
    /// OpenAI-compatible `/chat/completions` over HTTP.
    #[default]
    Openai,
    /// The `claude` command-line client.
    ClaudeCli,
}

/// The general-purpose chat model used for routing, agents and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: ChatBackend,
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: ChatBackend::Openai,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeout_seconds: 60,
        }
    }
}

/// The external market research service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            model: "sonar-reasoning".to_string(),
            base_url: "https://api.perplexity.ai".to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            timeout_seconds: 90,
        }
    }
}

/// Document chunking, embedding and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub embedding_model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks handed to the lawyer prompt.
    pub top_k: usize,
    /// Candidates considered by maximal marginal relevance.
    pub fetch_k: usize,
    /// 1.0 ranks purely by similarity, 0.0 purely by diversity.
    pub mmr_lambda: f32,
    pub timeout_seconds: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 4,
            fetch_k: 20,
            mmr_lambda: 0.5,
            timeout_seconds: 30,
        }
    }
}

/// Intent router tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Hybrid questions containing any of these inject the full holdings table
    /// instead of asking the analyst.
    pub impact_keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            impact_keywords: ["affect", "impact", "influence", "consequence", "outlook"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}
