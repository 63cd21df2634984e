//! Incremental NDJSON parser for streamed `/api/generate` responses
//!
//! Ollama streams one JSON object per line. Network chunks split lines at
//! arbitrary byte offsets, so bytes are buffered until a newline arrives.
//! - Buffer: 1MB maximum
//! - Blank lines are skipped

use serde::Deserialize;

use crate::errors::GenerationError;

/// Maximum buffer size (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// One line of a streamed generate response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Line-buffering parser
#[derive(Debug)]
pub struct NdjsonParser {
    buffer: Vec<u8>,
    max_buffer_size: usize,
}

impl NdjsonParser {
    /// Create new parser with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    /// Create parser with custom buffer capacity
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_buffer_size,
        }
    }

    /// Add bytes and return every complete line parsed so far
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>, GenerationError> {
        if self.buffer.len() + bytes.len() > self.max_buffer_size {
            return Err(GenerationError::Malformed(format!(
                "Buffer overflow: {} bytes exceeds maximum {}",
                self.buffer.len() + bytes.len(),
                self.max_buffer_size
            )));
        }
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(chunk) = parse_line(&line[..line.len() - 1])? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// Parse whatever is left once the stream ends without a trailing newline
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>, GenerationError> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }

    /// Bytes waiting for a newline
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for NdjsonParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &[u8]) -> Result<Option<GenerateChunk>, GenerationError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| GenerationError::Malformed(format!("{}: {}", e, text)))
}
