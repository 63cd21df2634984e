//! Text generation module
//!
//! Provides the Ollama API client and the NDJSON stream parser.

pub mod client;
pub mod parser;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::errors::GenerationError;

// Re-export commonly used types
pub use client::{model_listed, GenerateOptions, OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use parser::{GenerateChunk, NdjsonParser, MAX_BUFFER_SIZE};

/// Stream of response fragments
pub type FragmentStream = BoxStream<'static, Result<String, GenerationError>>;

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete response, trimmed
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Response as fragments; defaults to one fragment holding the whole answer
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream, GenerationError> {
        let text = self.generate(prompt).await?;
        Ok(stream::once(async move { Ok::<_, GenerationError>(text) }).boxed())
    }

    /// Name shown in logs and the banner
    fn model_name(&self) -> &str;
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        OllamaClient::generate(self, prompt).await
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream, GenerationError> {
        OllamaClient::generate_stream(self, prompt).await
    }

    fn model_name(&self) -> &str {
        self.model()
    }
}
