//! Error types for resumebuddy
//!
//! One error enum for the library, with a separate [`GenerationError`] so the
//! answer pipeline can tell a failing model apart from an unreachable one.

use thiserror::Error;

/// Main error type for the resumebuddy pipeline
#[derive(Error, Debug)]
pub enum ResumeError {
    /// PDF text extraction errors
    #[error("PDF extraction failed for {path}: {reason}")]
    PdfExtraction { path: String, reason: String },

    /// Chunk file or metadata record errors
    #[error("Invalid chunk record at line {line}: {reason}")]
    InvalidChunk { line: usize, reason: String },

    /// Index build or load errors
    #[error("Index error: {0}")]
    IndexError(String),

    /// Metadata and index disagree on the number of entries
    #[error("Index holds {vectors} vectors but metadata holds {records} records")]
    IndexMismatch { vectors: usize, records: usize },

    /// Vector dimension errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Nothing to index
    #[error("No chunks to index")]
    EmptyIndex,

    /// Blank question handed to the answer pipeline
    #[error("Question is empty")]
    EmptyQuestion,

    /// Embedding backend errors
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Text generation errors
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Ollama API errors outside of generation
    #[error("Ollama API error: {0}")]
    OllamaApiError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Failures of the text-generation call, split the way the answer
/// fallbacks need them.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The server answered with a non-success status
    #[error("Ollama returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never got a response (refused, timed out, reset)
    #[error("Could not reach Ollama: {0}")]
    Transport(String),

    /// The server accepted the request but the model reported an error
    #[error("Ollama model error: {0}")]
    Model(String),

    /// The response body was not the JSON we expected
    #[error("Malformed Ollama response: {0}")]
    Malformed(String),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, ResumeError>;

/// Convert anyhow errors to ResumeError
impl From<anyhow::Error> for ResumeError {
    fn from(err: anyhow::Error) -> Self {
        ResumeError::Generic(format!("{:#}", err))
    }
}
