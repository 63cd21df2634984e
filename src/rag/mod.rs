//! Retrieval-augmented answering over the résumé index
//!
//! Components:
//! - Retrieval Engine: embeds the question and searches the flat index
//! - Context Builder: formats retrieved chunks within a token budget
//! - Prompt: the recruiter persona template
//! - Pipeline: retrieval, prompt, generation and answer fallbacks

pub mod context;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

// Re-export key types
pub use context::{AssembledContext, ContextBuilder, ContextConfig};
pub use pipeline::{
    Answer, AnswerOutcome, RAGConfig, RAGPipeline, EMPTY_ANSWER_TEXT, MODEL_ERROR_TEXT,
    UNREACHABLE_TEXT,
};
pub use prompt::{PromptTemplate, PERSONA_RULES};
pub use retrieval::{RetrievalEngine, RetrievedChunk};
