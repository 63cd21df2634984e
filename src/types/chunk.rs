//! Resume chunk types
//!
//! A chunk is one labeled section of the resume. Chunks are written once by
//! the extraction step and read back unchanged by the index and retrieval
//! code, so every field is plain owned data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source tag stamped on every chunk cut from the resume PDF
pub const RESUME_SOURCE: &str = "resume_pdf";

/// Section category of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Education,
    Experience,
    Research,
    Project,
    Skills,
    Certifications,
}

impl ChunkKind {
    /// All categories in resume order
    pub const ALL: [ChunkKind; 6] = [
        ChunkKind::Education,
        ChunkKind::Experience,
        ChunkKind::Research,
        ChunkKind::Project,
        ChunkKind::Skills,
        ChunkKind::Certifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Education => "education",
            ChunkKind::Experience => "experience",
            ChunkKind::Research => "research",
            ChunkKind::Project => "project",
            ChunkKind::Skills => "skills",
            ChunkKind::Certifications => "certifications",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChunkKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown chunk type: {}", s))
    }
}

/// Provenance of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source: String,
    /// Creation date as `YYYY-MM-DD`
    pub created_on: String,
}

/// A labeled span of resume text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub title: String,
    pub content: String,
    pub meta: ChunkMeta,
}

impl Chunk {
    /// Create a chunk; content is trimmed the way it is stored on disk
    pub fn new(
        chunk_id: impl Into<String>,
        kind: ChunkKind,
        title: impl Into<String>,
        content: &str,
        created_on: chrono::NaiveDate,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            kind,
            title: title.into(),
            content: content.trim().to_string(),
            meta: ChunkMeta {
                source: RESUME_SOURCE.to_string(),
                created_on: created_on.format("%Y-%m-%d").to_string(),
            },
        }
    }

    /// Text fed to the embedding model at index-build time
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    /// First `max_chars` characters of the content, for result listings
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}
