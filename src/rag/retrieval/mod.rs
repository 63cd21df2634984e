pub mod engine;

pub use engine::{RetrievalEngine, RetrievedChunk};
