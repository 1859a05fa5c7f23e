use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Service {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0} not found in environment variables.")]
    MissingCredential(String),

    #[error("Data error: {0}")]
    Data(#[from] concierge_data::DataError),
}
