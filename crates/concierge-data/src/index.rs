use async_trait::async_trait;
use tracing::debug;

use crate::documents::Chunk;
use crate::error::DataError;

/// Turns text into vectors. Implemented over a hosted embedding service in
/// production and by deterministic fakes in tests.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DataError>;
}

/// Brute-force vector index over one client's document chunks.
#[derive(Debug, Clone, Default)]
pub struct SemanticIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl SemanticIndex {
    /// Embed every chunk and build the index.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self, DataError> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(DataError::Embedding(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        debug!(chunks = chunks.len(), "Built semantic index");
        Ok(Self { chunks, vectors })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(i, score)| (&self.chunks[i], score))
            .collect()
    }

    /// Maximal marginal relevance: take the `fetch_k` nearest chunks, then pick
    /// `k` of them, each maximising
    /// `lambda * sim(query, c) - (1 - lambda) * max sim(c, already picked)`.
    pub fn max_marginal_relevance(
        &self,
        query: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Vec<&Chunk> {
        let mut candidates: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(fetch_k.max(k));

        let mut selected: Vec<usize> = Vec::with_capacity(k);
        while selected.len() < k && !candidates.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (pos, &(idx, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&s| cosine_similarity(&self.vectors[idx], &self.vectors[s]))
                    .fold(f32::NEG_INFINITY, f32::max);
                let redundancy = if selected.is_empty() { 0.0 } else { redundancy };
                let score = lambda * relevance - (1.0 - lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }
            let (idx, _) = candidates.remove(best_pos);
            selected.push(idx);
        }

        selected.into_iter().map(|i| &self.chunks[i]).collect()
    }

    /// Embed `query` and return chunks chosen by maximal marginal relevance.
    pub async fn retrieve(
        &self,
        query: &str,
        embedder: &dyn Embedder,
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<&Chunk>, DataError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = embedder.embed(&[query.to_string()]).await?;
        let query_vec = vectors
            .pop()
            .ok_or_else(|| DataError::Embedding("no vector returned for query".to_string()))?;
        Ok(self.max_marginal_relevance(&query_vec, k, fetch_k, lambda))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
