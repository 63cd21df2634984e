//! resumebuddy - Résumé question answering over a local model
//!
//! A small retrieval-augmented pipeline: a résumé PDF is split into labeled
//! sections, each section is embedded into a flat vector index, and
//! recruiter questions are answered by a local Ollama model from the
//! nearest sections.
//!
//! # Architecture
//!
//! - **extract**: PDF text, section splitting, chunk file
//! - **embedding / index**: sentence vectors and the flat inner-product index
//! - **rag / generation**: retrieval, prompt assembly, Ollama calls
//! - **repl / cli / doctor**: the terminal front end

pub mod errors;
pub mod types;

pub mod extract;
pub mod embedding;
pub mod index;

pub mod generation;
pub mod rag;

pub mod cli;
pub mod doctor;
pub mod repl;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{GenerationError, ResumeError, Result};
