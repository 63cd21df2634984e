//! Sentence embeddings for chunks and queries
//!
//! Two backends sit behind the [`Embedder`] trait:
//! - local: a sentence-transformers BERT model run in-process with candle
//! - ollama: the `/api/embeddings` endpoint of the local Ollama server

pub mod engine;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cli::config::EmbeddingConfig;
use crate::errors::Result;

pub use engine::{CandleEmbedder, DEFAULT_LOCAL_MODEL};
pub use ollama::OllamaEmbedder;

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Local,
    Ollama,
}

/// Turns text into fixed-length vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier recorded in the index so a mismatched model is caught on load
    fn model_id(&self) -> &str;

    /// Embed several texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            crate::errors::ResumeError::EmbeddingError("backend returned no vector".to_string())
        })
    }
}

/// Scale a vector to unit length in place; all-zero vectors are left alone
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Build the configured embedder
///
/// The local backend downloads model files on first use, so it is loaded on
/// a blocking thread.
pub async fn from_config(config: &EmbeddingConfig, ollama_url: &str) -> Result<Box<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Local => {
            let model_id = config.model.clone();
            let embedder = tokio::task::spawn_blocking(move || CandleEmbedder::load(&model_id))
                .await
                .map_err(|e| {
                    crate::errors::ResumeError::EmbeddingError(format!(
                        "model loader panicked: {}",
                        e
                    ))
                })??;
            Ok(Box::new(embedder))
        }
        EmbeddingBackend::Ollama => Ok(Box::new(OllamaEmbedder::new(
            ollama_url,
            &config.ollama_model,
        )?)),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::KeywordEmbedder;
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_normalize_l2_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_l2_zero_vector() {
        let mut v = vec![0.0; 4];
        normalize_l2(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_backend_serde() {
        let backend: EmbeddingBackend = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(backend, EmbeddingBackend::Ollama);
    }

    #[tokio::test]
    async fn test_default_embed_uses_batch() {
        let embedder = KeywordEmbedder::new(&["rust", "sql"]);
        let v = embedder.embed("Rust and more rust, no SQL? sql!").await.unwrap();
        assert_eq!(v, vec![2.0, 2.0]);
    }

    #[quickcheck]
    fn prop_normalized_vectors_have_unit_norm(values: Vec<i16>) -> bool {
        let mut v: Vec<f32> = values.iter().map(|&x| x as f32).collect();
        let all_zero = v.iter().all(|&x| x == 0.0);
        normalize_l2(&mut v);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if all_zero {
            norm == 0.0
        } else {
            (norm - 1.0).abs() < 1e-4
        }
    }
}
