//! Query-side retrieval over the résumé index
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::embedding::{normalize_l2, Embedder};
use crate::errors::Result;
use crate::index::IndexStore;
use crate::types::Chunk;

/// Chunk returned for a query, with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// 1-based rank in the result list
    pub rank: usize,
    pub score: f32,
    pub chunk: Chunk,
}

/// Retrieval engine for semantic search
pub struct RetrievalEngine {
    store: Arc<IndexStore>,
    embedder: Arc<dyn Embedder>,
    default_top_k: usize,
}

impl RetrievalEngine {
    /// Create new retrieval engine
    ///
    /// Fails when the index was built with a different embedding model.
    pub fn new(store: Arc<IndexStore>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        store.ensure_model(embedder.as_ref())?;
        Ok(Self {
            store,
            embedder,
            default_top_k: 2,
        })
    }

    /// Set the `k` used by [`RetrievalEngine::retrieve`]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k.max(1);
        self
    }

    /// Retrieve chunks matching query
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        self.retrieve_with_params(query, self.default_top_k).await
    }

    /// Retrieve the `top_k` nearest chunks, best first
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut vector = self.embedder.embed(query).await?;
        normalize_l2(&mut vector);

        let results: Vec<RetrievedChunk> = self
            .store
            .search(&vector, top_k)?
            .into_iter()
            .enumerate()
            .map(|(i, (hit, chunk))| RetrievedChunk {
                rank: i + 1,
                score: hit.score,
                chunk: chunk.clone(),
            })
            .collect();

        log::debug!(
            "retrieved {} chunk(s) in {}ms: {:?}",
            results.len(),
            started.elapsed().as_millis(),
            results.iter().map(|r| r.chunk.chunk_id.as_str()).collect::<Vec<_>>()
        );

        Ok(results)
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_support::KeywordEmbedder;
    use crate::types::ChunkKind;
    use chrono::NaiveDate;

    fn chunks() -> Vec<Chunk> {
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        vec![
            Chunk::new("edu_001", ChunkKind::Education, "Education", "University degree", day),
            Chunk::new(
                "exp_001",
                ChunkKind::Experience,
                "Internship",
                "Built a data pipeline",
                day,
            ),
            Chunk::new("skills_001", ChunkKind::Skills, "Skills", "Rust, Python, SQL", day),
        ]
    }

    async fn engine() -> RetrievalEngine {
        let embedder: Arc<dyn Embedder> =
            Arc::new(KeywordEmbedder::new(&["university", "internship", "pipeline", "rust"]));
        let store = IndexStore::build(chunks(), embedder.as_ref()).await.unwrap();
        RetrievalEngine::new(Arc::new(store), embedder).unwrap()
    }

    #[tokio::test]
    async fn test_best_match_ranks_first() {
        let engine = engine().await;
        let results = engine.retrieve("Tell me about your internship").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].chunk.chunk_id, "exp_001");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_top_k_is_bounded_by_index_size() {
        let engine = engine().await;
        let results = engine.retrieve_with_params("rust", 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.chunk_id, "skills_001");
        assert_eq!(results[2].rank, 3);
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let engine = engine().await;
        assert!(engine.retrieve("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_mismatch_is_rejected() {
        let builder = KeywordEmbedder::new(&["rust"]);
        let store = IndexStore::build(chunks(), &builder).await.unwrap();

        struct OtherModel;
        #[async_trait::async_trait]
        impl Embedder for OtherModel {
            fn model_id(&self) -> &str {
                "other"
            }
            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![1.0]).collect())
            }
        }

        assert!(RetrievalEngine::new(Arc::new(store), Arc::new(OtherModel)).is_err());
    }
}
