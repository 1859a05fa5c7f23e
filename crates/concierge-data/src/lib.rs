pub mod documents;
pub mod error;
pub mod index;
pub mod memory;
pub mod portfolio;

pub use documents::{Chunk, Document};
pub use error::DataError;
pub use index::{Embedder, SemanticIndex};
pub use memory::{ClientCache, ClientState};
pub use portfolio::{ClientPortfolio, PortfolioStore};
