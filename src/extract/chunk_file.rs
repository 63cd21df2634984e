//! JSON Lines persistence for chunks
//!
//! The same format backs the extraction output (`chunks.jsonl`) and the
//! metadata file that sits next to the vector index.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{ResumeError, Result};
use crate::types::Chunk;

/// Write chunks one JSON object per line, creating parent directories
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for chunk in chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    log::debug!("wrote {} chunk(s) to {}", chunks.len(), path.display());
    Ok(())
}

/// Read chunks back in file order; blank lines are skipped
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let reader = BufReader::new(File::open(path)?);
    let mut chunks = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: Chunk = serde_json::from_str(&line).map_err(|e| ResumeError::InvalidChunk {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkKind;
    use chrono::NaiveDate;

    fn chunk(id: &str, kind: ChunkKind, content: &str) -> Chunk {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Chunk::new(id, kind, id.to_uppercase(), content, day)
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("chunks.jsonl");
        let chunks = vec![
            chunk("edu_001", ChunkKind::Education, "Penn State — B.S."),
            chunk("skills_001", ChunkKind::Skills, "Rust\nSQL"),
        ];

        write_chunks(&path, &chunks).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.contains("—"), "non-ascii text is written as-is");

        assert_eq!(read_chunks(&path).unwrap(), chunks);
    }

    #[test]
    fn test_read_reports_bad_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        let good = serde_json::to_string(&chunk("a", ChunkKind::Project, "x")).unwrap();
        std::fs::write(&path, format!("{}\n\n{{\"chunk_id\": 3}}\n", good)).unwrap();

        match read_chunks(&path).unwrap_err() {
            ResumeError::InvalidChunk { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_chunks(Path::new("/no/such/chunks.jsonl")).unwrap_err();
        assert!(matches!(err, ResumeError::IoError(_)));
    }
}
