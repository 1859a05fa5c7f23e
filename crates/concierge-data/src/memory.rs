use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use concierge_models::config::{CacheConfig, DataConfig, RetrievalConfig};
use moka::future::Cache;
use tracing::{info, warn};

use crate::documents::{chunk_documents, load_documents, resolve_documents_dir};
use crate::error::DataError;
use crate::index::{Embedder, SemanticIndex};
use crate::portfolio::{ClientPortfolio, PortfolioStore};

/// Everything built for one client at session start.
#[derive(Debug)]
pub struct ClientState {
    pub client: String,
    pub portfolio: Arc<ClientPortfolio>,
    pub documents_dir: PathBuf,
    pub index: Arc<SemanticIndex>,
    /// Modification time of the dataset file when this state was built.
    dataset_modified: Option<SystemTime>,
}

/// In-memory per-client state backed by moka.
///
/// Entries are built once per client (concurrent callers share one build),
/// evicted after the configured TTL or capacity, and rebuilt when the
/// portfolio file's modification time changes.
pub struct ClientCache {
    inner: Cache<String, Arc<ClientState>>,
    data: DataConfig,
    retrieval: RetrievalConfig,
    embedder: Arc<dyn Embedder>,
}

impl ClientCache {
    pub fn new(
        data: DataConfig,
        retrieval: RetrievalConfig,
        cache: &CacheConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(cache.max_clients)
                .time_to_live(Duration::from_secs(cache.ttl_seconds))
                .build(),
            data,
            retrieval,
            embedder,
        }
    }

    /// Get the client's state, building it on first use or after the dataset changed.
    pub async fn get(&self, client: &str) -> Result<Arc<ClientState>, DataError> {
        if let Some(state) = self.inner.get(client).await {
            if state.dataset_modified == file_modified(Path::new(&self.data.portfolio_path)) {
                return Ok(state);
            }
            info!(client = %client, "Portfolio dataset changed, rebuilding client state");
            self.inner.invalidate(client).await;
        }

        self.inner
            .try_get_with(client.to_string(), self.build(client))
            .await
            .map_err(|e| DataError::Unavailable(format!("{client}: {e}")))
    }

    pub async fn invalidate(&self, client: &str) {
        self.inner.invalidate(client).await;
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    async fn build(&self, client: &str) -> Result<Arc<ClientState>, DataError> {
        let start = Instant::now();
        let dataset_path = Path::new(&self.data.portfolio_path);
        let dataset_modified = file_modified(dataset_path);

        let portfolio = PortfolioStore::load(dataset_path)?.for_client(client);
        if portfolio.is_empty() {
            warn!(client = %client, "No portfolio rows for client");
        }

        let documents_dir = resolve_documents_dir(
            Path::new(&self.data.documents_dir),
            client,
            &self.data.default_client,
        )?;
        let documents = load_documents(&documents_dir)?;
        let chunks = chunk_documents(
            &documents,
            self.retrieval.chunk_size,
            self.retrieval.chunk_overlap,
        );
        let index = SemanticIndex::build(chunks, self.embedder.as_ref()).await?;

        info!(
            client = %client,
            holdings = portfolio.len(),
            documents = documents.len(),
            chunks = index.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Built client state"
        );

        Ok(Arc::new(ClientState {
            client: client.to_string(),
            portfolio: Arc::new(portfolio),
            documents_dir,
            index: Arc::new(index),
            dataset_modified,
        }))
    }
}

fn file_modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    const CSV: &str = "\
Family,Asset_Name,Asset_Class,Value_USD,Liquidity
Wayne,Wayne Manor,Real Estate,50000000,Low
Stark,Winterfell,Real Estate,10000000,Low
";

    struct Fixture {
        _root: tempfile::TempDir,
        data: DataConfig,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let csv_path = root.path().join("portfolio.csv");
        std::fs::write(&csv_path, CSV).unwrap();
        let docs = root.path().join("legal_docs");
        std::fs::create_dir_all(docs.join("wayne")).unwrap();
        std::fs::write(docs.join("wayne/will.txt"), "Alfred Pennyworth is executor.").unwrap();

        let data = DataConfig {
            portfolio_path: csv_path.display().to_string(),
            documents_dir: docs.display().to_string(),
            default_client: "Wayne".to_string(),
        };
        Fixture { _root: root, data }
    }

    fn cache(data: DataConfig, embedder: Arc<CountingEmbedder>) -> ClientCache {
        ClientCache::new(
            data,
            RetrievalConfig::default(),
            &CacheConfig::default(),
            embedder,
        )
    }

    #[tokio::test]
    async fn builds_once_per_client() {
        let fx = fixture();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cache = cache(fx.data.clone(), Arc::clone(&embedder));

        let first = cache.get("Wayne").await.unwrap();
        let second = cache.get("Wayne").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.portfolio.len(), 1);
        assert_eq!(first.index.len(), 1);
    }

    #[tokio::test]
    async fn client_without_documents_uses_default_dir() {
        let fx = fixture();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cache = cache(fx.data.clone(), embedder);

        let stark = cache.get("Stark").await.unwrap();
        assert!(stark.documents_dir.ends_with("wayne"));
        assert!(stark
            .portfolio
            .rows()
            .iter()
            .all(|r| r.family == "Stark"));
    }

    #[tokio::test]
    async fn rebuilds_when_dataset_changes() {
        let fx = fixture();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cache = cache(fx.data.clone(), embedder);

        let before = cache.get("Wayne").await.unwrap();
        assert_eq!(before.portfolio.len(), 1);

        let updated = format!("{CSV}Wayne,Cash Reserve,Cash,1000000,High\n");
        std::fs::write(&fx.data.portfolio_path, updated).unwrap();
        let file = std::fs::File::options()
            .write(true)
            .open(&fx.data.portfolio_path)
            .unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let after = cache.get("Wayne").await.unwrap();
        assert_eq!(after.portfolio.len(), 2);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn missing_dataset_is_unavailable() {
        let fx = fixture();
        let mut data = fx.data.clone();
        data.portfolio_path = "/nonexistent/portfolio.csv".to_string();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cache = cache(data, embedder);

        let result = cache.get("Wayne").await;
        assert!(matches!(result, Err(DataError::Unavailable(_))));
    }
}
