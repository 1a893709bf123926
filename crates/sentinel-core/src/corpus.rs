//! Statutory corpus: the fixed law passages retrieval draws on.
//!
//! The file format is plain text. Sections are separated by a line made only
//! of `=` characters (at least 10). The first line of a section is its title.
//! Anything before the first separator is a preamble and is skipped, as are
//! sections shorter than [`MIN_SECTION_CHARS`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SentinelError};

const BUILTIN_CORPUS: &str = include_str!("../corpus/statutes.txt");

pub const MIN_SECTION_CHARS: usize = 50;
const MIN_SEPARATOR_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawSection {
    /// Position within the corpus (0-based, after skipping).
    pub index: usize,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct StatutoryCorpus {
    sections: Vec<LawSection>,
}

impl StatutoryCorpus {
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CORPUS)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let corpus = Self::parse(&text)?;
        info!(path = %path.display(), sections = corpus.len(), "loaded statutory corpus");
        Ok(corpus)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut chunks: Vec<Vec<&str>> = vec![Vec::new()];
        for line in text.lines() {
            if is_separator(line) {
                chunks.push(Vec::new());
            } else if let Some(chunk) = chunks.last_mut() {
                chunk.push(line);
            }
        }
        // Text before the first separator is a preamble.
        if chunks.len() > 1 {
            chunks.remove(0);
        }

        let sections: Vec<LawSection> = chunks
            .into_iter()
            .map(|lines| lines.join("\n").trim().to_string())
            .filter(|text| text.chars().count() >= MIN_SECTION_CHARS)
            .enumerate()
            .map(|(index, text)| {
                let title = text.lines().next().unwrap_or_default().trim().to_string();
                LawSection { index, title, text }
            })
            .collect();

        if sections.is_empty() {
            return Err(SentinelError::Corpus(
                "the statutory corpus contains no usable sections".into(),
            ));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[LawSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= MIN_SEPARATOR_LEN && line.bytes().all(|b| b == b'=')
}
