//! PDF text extraction
//!
//! Thin wrapper over `pdf-extract` that keeps page boundaries so callers can
//! either join the whole document or peek at a single page.

use std::path::Path;

use crate::errors::{ResumeError, Result};

/// Text of a PDF, one entry per page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub pages: Vec<String>,
}

impl PdfText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined by a newline
    pub fn joined(&self) -> String {
        self.pages.join("\n")
    }

    /// First `max_chars` characters of page one
    pub fn first_page_preview(&self, max_chars: usize) -> String {
        self.pages
            .first()
            .map(|page| page.chars().take(max_chars).collect())
            .unwrap_or_default()
    }
}

/// Read a PDF and extract the text of every page
pub fn read_pdf(path: &Path) -> Result<PdfText> {
    let bytes = std::fs::read(path)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
        ResumeError::PdfExtraction {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    log::info!("extracted {} page(s) from {}", pages.len(), path.display());
    Ok(PdfText { pages })
}

/// Extract the whole document as one string
pub fn extract_text(path: &Path) -> Result<String> {
    Ok(read_pdf(path)?.joined())
}
