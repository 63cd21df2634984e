//! Section splitting for resume text
//!
//! Resume PDFs come out of text extraction as a flat run of lines. Known
//! all-caps headers (EDUCATION, TECHNICAL SKILLS, ...) mark where one
//! section ends and the next begins; each configured section becomes one
//! chunk.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::types::{Chunk, ChunkKind};

/// Name of the implicit section holding lines before the first header
pub const PREAMBLE_SECTION: &str = "HEADER";

/// How one resume header maps to a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    /// Header line exactly as it appears after normalization
    pub header: String,
    pub kind: ChunkKind,
    pub chunk_id: String,
    pub title: String,
}

impl SectionLayout {
    pub fn new(header: &str, kind: ChunkKind, chunk_id: &str, title: &str) -> Self {
        Self {
            header: header.to_string(),
            kind,
            chunk_id: chunk_id.to_string(),
            title: title.to_string(),
        }
    }
}

/// The six standard resume sections
pub fn default_layout() -> Vec<SectionLayout> {
    vec![
        SectionLayout::new("EDUCATION", ChunkKind::Education, "edu_001", "Education"),
        SectionLayout::new(
            "PROFESSIONAL INTERNSHIP EXPERIENCE",
            ChunkKind::Experience,
            "exp_001",
            "Professional Internship Experience",
        ),
        SectionLayout::new(
            "ACADEMIC RESEARCH EXPERIENCE",
            ChunkKind::Research,
            "res_001",
            "Academic Research Experience",
        ),
        SectionLayout::new(
            "PERSONAL PROJECT EXPERIENCE",
            ChunkKind::Project,
            "proj_001",
            "Personal Project Experience",
        ),
        SectionLayout::new(
            "TECHNICAL SKILLS",
            ChunkKind::Skills,
            "skills_001",
            "Technical Skills",
        ),
        SectionLayout::new(
            "CERTIFICATIONS",
            ChunkKind::Certifications,
            "cert_001",
            "Certifications",
        ),
    ]
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Trim every line, drop blank ones, collapse inner whitespace
pub fn normalize_lines(text: &str) -> Vec<String> {
    let re = whitespace_run();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| re.replace_all(line, " ").into_owned())
        .collect()
}

/// Ordered map of section name to body lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    entries: Vec<(String, Vec<String>)>,
}

impl Sections {
    /// Body lines of a section
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Section names in order of first appearance
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(header, _)| header.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start (or restart) a section and return its index
    fn open(&mut self, name: &str) -> usize {
        match self.entries.iter().position(|(header, _)| header == name) {
            Some(idx) => {
                self.entries[idx].1.clear();
                idx
            }
            None => {
                self.entries.push((name.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        }
    }
}

/// Split normalized lines on exact header matches
///
/// Lines seen before any header land in [`PREAMBLE_SECTION`]. A header that
/// shows up twice keeps its original position but only the later body.
pub fn split_sections<S: AsRef<str>>(lines: &[S], headers: &HashSet<&str>) -> Sections {
    let mut sections = Sections::default();
    let mut current = sections.open(PREAMBLE_SECTION);

    for line in lines {
        let line = line.as_ref();
        if headers.contains(line) {
            current = sections.open(line);
        } else {
            sections.entries[current].1.push(line.to_string());
        }
    }

    sections
}

/// Turn the configured sections that are present into chunks, in layout order
pub fn build_chunks(sections: &Sections, layout: &[SectionLayout], today: NaiveDate) -> Vec<Chunk> {
    layout
        .iter()
        .filter_map(|entry| {
            sections.get(&entry.header).map(|lines| {
                Chunk::new(
                    entry.chunk_id.clone(),
                    entry.kind,
                    entry.title.clone(),
                    &lines.join("\n"),
                    today,
                )
            })
        })
        .collect()
}

/// Full text-to-chunks pass
pub fn chunk_text(text: &str, layout: &[SectionLayout], today: NaiveDate) -> Vec<Chunk> {
    let lines = normalize_lines(text);
    let headers: HashSet<&str> = layout.iter().map(|entry| entry.header.as_str()).collect();
    let sections = split_sections(&lines, &headers);
    log::debug!(
        "split {} lines into sections: {:?}",
        lines.len(),
        sections.names().collect::<Vec<_>>()
    );
    build_chunks(&sections, layout, today)
}
