use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("Documents not available: {0}")]
    Documents(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Client state unavailable: {0}")]
    Unavailable(String),
}
