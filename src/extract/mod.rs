//! Resume extraction: PDF → normalized lines → sections → chunks
//!
//! Components:
//! - pdf: page-wise text extraction
//! - sections: header-based splitting and chunk construction
//! - chunk_file: JSON Lines persistence shared with the index metadata

pub mod chunk_file;
pub mod pdf;
pub mod sections;

use chrono::NaiveDate;
use std::path::Path;

use crate::errors::Result;
use crate::types::Chunk;

pub use chunk_file::{read_chunks, write_chunks};
pub use pdf::{extract_text, read_pdf, PdfText};
pub use sections::{chunk_text, default_layout, normalize_lines, split_sections, SectionLayout};

/// Extract a resume PDF into chunks and write them to `out`
pub fn build_chunk_file(
    pdf_path: &Path,
    out: &Path,
    layout: &[SectionLayout],
    today: NaiveDate,
) -> Result<Vec<Chunk>> {
    let text = extract_text(pdf_path)?;
    let chunks = chunk_text(&text, layout, today);
    if chunks.is_empty() {
        log::warn!(
            "no known section headers found in {}; chunk file will be empty",
            pdf_path.display()
        );
    }
    write_chunks(out, &chunks)?;
    Ok(chunks)
}
