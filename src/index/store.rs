//! Index + metadata pair on disk
//!
//! The vector file and the metadata file are always written together and
//! must line up: vector `i` belongs to record `i`. Loading refuses a pair
//! that disagrees on length, so a half-rebuilt index fails loudly instead of
//! answering with the wrong section.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::embedding::{normalize_l2, Embedder};
use crate::errors::{ResumeError, Result};
use crate::extract::{read_chunks, write_chunks};
use crate::index::flat::{FlatIndex, Hit};
use crate::types::Chunk;

/// Locations of the two index files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub index: PathBuf,
    pub metadata: PathBuf,
}

impl IndexPaths {
    pub fn new(index: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            metadata: metadata.into(),
        }
    }

    pub fn exist(&self) -> bool {
        self.index.exists() && self.metadata.exists()
    }
}

/// Serialized form of the vector file
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    model: String,
    #[serde(flatten)]
    index: FlatIndex,
}

/// Vector index with the chunks it was built from
#[derive(Debug, Clone)]
pub struct IndexStore {
    model: String,
    index: FlatIndex,
    chunks: Vec<Chunk>,
}

impl IndexStore {
    /// Embed every chunk (title + content), normalize, and index in order
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Err(ResumeError::EmptyIndex);
        }

        let texts: Vec<String> = chunks.iter().map(Chunk::embedding_text).collect();
        let mut vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(ResumeError::EmbeddingError(format!(
                "expected {} vectors, backend returned {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimension = vectors[0].len();
        for vector in vectors.iter_mut() {
            normalize_l2(vector);
        }
        let index = FlatIndex::from_vectors(dimension, vectors)?;

        log::info!(
            "indexed {} chunk(s) with {} ({} dims)",
            index.len(),
            embedder.model_id(),
            dimension
        );

        Ok(Self {
            model: embedder.model_id().to_string(),
            index,
            chunks,
        })
    }

    /// Assemble from parts, enforcing the one-vector-per-record rule
    pub fn from_parts(model: String, index: FlatIndex, chunks: Vec<Chunk>) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(ResumeError::IndexMismatch {
                vectors: index.len(),
                records: chunks.len(),
            });
        }
        Ok(Self {
            model,
            index,
            chunks,
        })
    }

    /// Write the vector file and the metadata file together
    pub fn save(&self, paths: &IndexPaths) -> Result<()> {
        if let Some(parent) = paths.index.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = IndexFile {
            model: self.model.clone(),
            index: self.index.clone(),
        };
        let mut writer = BufWriter::new(File::create(&paths.index)?);
        serde_json::to_writer(&mut writer, &file)?;
        writer.flush()?;

        write_chunks(&paths.metadata, &self.chunks)?;
        Ok(())
    }

    /// Read both files back and check they line up
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let reader = BufReader::new(File::open(&paths.index).map_err(|e| {
            ResumeError::IndexError(format!("cannot open {}: {}", paths.index.display(), e))
        })?);
        let file: IndexFile = serde_json::from_reader(reader)?;
        let index = FlatIndex::from_vectors(file.index.dimension(), file.index.vectors().to_vec())?;

        let chunks = read_chunks(&paths.metadata)?;
        let store = Self::from_parts(file.model, index, chunks)?;

        log::debug!(
            "loaded index {} ({} vectors, model {})",
            paths.index.display(),
            store.len(),
            store.model
        );
        Ok(store)
    }

    /// Check that the query embedder matches the one used at build time
    pub fn ensure_model(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.model_id() != self.model {
            return Err(ResumeError::IndexError(format!(
                "index was built with {} but queries use {}; rebuild the index",
                self.model,
                embedder.model_id()
            )));
        }
        Ok(())
    }

    /// Nearest chunks to an already-normalized query vector
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Hit, &Chunk)>> {
        let hits = self.index.search(query, k)?;
        hits.into_iter()
            .map(|hit| {
                self.chunk(hit.position)
                    .map(|chunk| (hit, chunk))
                    .ok_or_else(|| {
                        let reason = format!("no metadata for position {}", hit.position);
                        ResumeError::IndexError(reason)
                    })
            })
            .collect()
    }

    /// Record stored at a vector position
    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// True when the metadata file exists and has the same number of records as
/// the index file has vectors
pub fn is_consistent(paths: &IndexPaths) -> bool {
    IndexStore::load(paths).is_ok()
}

/// Convenience for callers holding plain paths
pub fn load_from(index: &Path, metadata: &Path) -> Result<IndexStore> {
    IndexStore::load(&IndexPaths::new(index, metadata))
}
