//! Type definitions module
//!
//! Resume chunks and chat turns shared by every stage of the pipeline.

pub mod chat;
pub mod chunk;

// Re-export commonly used types
pub use chat::{ChatRole, ChatTurn};
pub use chunk::{Chunk, ChunkKind, ChunkMeta, RESUME_SOURCE};
