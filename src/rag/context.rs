//! Context assembly for the answer prompt
use serde::{Deserialize, Serialize};

use crate::rag::retrieval::RetrievedChunk;

/// Rough characters-per-token ratio used for budgeting
const CHARS_PER_TOKEN: usize = 4;

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum tokens for retrieved context
    pub max_context_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 1500,
        }
    }
}

/// Assembled context for prompt augmentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// The formatted context text
    pub text: String,
    /// Number of chunks included
    pub chunk_count: usize,
    /// Estimated token count
    pub estimated_tokens: usize,
    /// Chunk IDs included, in prompt order
    pub chunk_ids: Vec<String>,
    /// Whether the first chunk had to be cut to fit the budget
    pub truncated: bool,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

/// Context builder for assembling RAG context
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    /// Create new context builder with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Build `"{title}:\n{content}"` blocks separated by a blank line
    ///
    /// Chunks are taken in rank order until the next one would overflow the
    /// token budget. The first chunk is always included, cut down to the
    /// budget if it is too long on its own.
    pub fn build(&self, chunks: &[RetrievedChunk]) -> AssembledContext {
        let budget_chars = self.config.max_context_tokens.saturating_mul(CHARS_PER_TOKEN);
        let mut parts: Vec<String> = Vec::new();
        let mut used_chars = 0;
        let mut ids = Vec::new();
        let mut truncated = false;

        for retrieved in chunks {
            let mut block = format_chunk(retrieved);
            let block_chars = block.chars().count();
            // the blank line between blocks counts against the budget
            let separator = if parts.is_empty() { 0 } else { 2 };

            if used_chars + separator + block_chars > budget_chars {
                if !parts.is_empty() {
                    break;
                }
                block = block.chars().take(budget_chars).collect();
                truncated = true;
            }

            used_chars += separator + block.chars().count();
            parts.push(block);
            ids.push(retrieved.chunk.chunk_id.clone());
        }

        if truncated {
            log::warn!(
                "first chunk exceeds the {}-token context budget and was truncated",
                self.config.max_context_tokens
            );
        }

        AssembledContext {
            text: parts.join("\n\n"),
            chunk_count: parts.len(),
            estimated_tokens: used_chars / CHARS_PER_TOKEN,
            chunk_ids: ids,
            truncated,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}

fn format_chunk(retrieved: &RetrievedChunk) -> String {
    format!("{}:\n{}", retrieved.chunk.title, retrieved.chunk.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkKind};
    use chrono::NaiveDate;

    fn retrieved(rank: usize, id: &str, title: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            rank,
            score: 1.0 / rank as f32,
            chunk: Chunk::new(
                id,
                ChunkKind::Experience,
                title,
                content,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ),
        }
    }

    #[test]
    fn test_blocks_joined_by_blank_line() {
        let builder = ContextBuilder::new();
        let context = builder.build(&[
            retrieved(1, "exp_001", "Internship", "Built dashboards"),
            retrieved(2, "skills_001", "Skills", "Rust, SQL"),
        ]);

        assert_eq!(
            context.text,
            "Internship:\nBuilt dashboards\n\nSkills:\nRust, SQL"
        );
        assert_eq!(context.chunk_count, 2);
        assert_eq!(context.chunk_ids, vec!["exp_001", "skills_001"]);
        assert!(!context.truncated);
    }

    #[test]
    fn test_empty_input() {
        let context = ContextBuilder::new().build(&[]);
        assert!(context.is_empty());
        assert_eq!(context.text, "");
    }

    #[test]
    fn test_stops_before_overflowing_budget() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: 10,
        });
        // first block is 20 chars, second would push past 40
        let context = builder.build(&[
            retrieved(1, "a", "A", "x".repeat(17).as_str()),
            retrieved(2, "b", "B", "y".repeat(30).as_str()),
        ]);

        assert_eq!(context.chunk_count, 1);
        assert_eq!(context.chunk_ids, vec!["a"]);
        assert_eq!(context.estimated_tokens, 5);
    }

    #[test]
    fn test_oversized_first_chunk_is_truncated() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: 5,
        });
        let context = builder.build(&[retrieved(1, "a", "Long", "z".repeat(100).as_str())]);

        assert_eq!(context.chunk_count, 1);
        assert!(context.truncated);
        assert_eq!(context.text.chars().count(), 20);
        assert!(context.text.starts_with("Long:\n"));
    }

    #[test]
    fn test_huge_budget_keeps_everything() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: usize::MAX,
        });
        let context = builder.build(&[
            retrieved(1, "a", "A", "first"),
            retrieved(2, "b", "B", "second"),
        ]);

        assert_eq!(context.chunk_count, 2);
        assert!(!context.truncated);
    }
}
