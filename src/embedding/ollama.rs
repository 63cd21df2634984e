//! Embeddings served by Ollama's `/api/embeddings` endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::embedding::Embedder;
use crate::errors::{ResumeError, Result};

/// Request timeout (60 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Embedder backed by a model pulled into the local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ResumeError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| ResumeError::EmbeddingError(format!("Failed to reach Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ResumeError::EmbeddingError(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ResumeError::EmbeddingError(format!("Failed to parse embedding: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(ResumeError::EmbeddingError(format!(
                "model {} returned an empty embedding",
                self.model
            )));
        }

        Ok(parsed.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(text).await?);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = OllamaEmbedder::new("http://localhost:11434/", "nomic-embed-text").unwrap();
        assert_eq!(embedder.model_id(), "nomic-embed-text");
        assert_eq!(embedder.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(EmbeddingRequest {
            model: "nomic-embed-text",
            prompt: "hello",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"model": "nomic-embed-text", "prompt": "hello"}));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        // Port 9 is never an Ollama server; an empty batch must not touch it
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "m").unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "m").unwrap();
        let err = embedder.embed("hi").await.unwrap_err();
        assert!(matches!(err, ResumeError::EmbeddingError(_)));
    }
}
