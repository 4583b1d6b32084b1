//! Section-aware chunking of SOP text with a sliding-window fallback.

use regex::Regex;

use super::error::DocumentError;
use super::types::{Chunk, ChunkMetadata, SopMetadata};

pub const DEFAULT_SECTION_HEADERS: [&str; 14] = [
    "Purpose",
    "References",
    "Scope",
    "Allowable Exceptions",
    "Procedures",
    "Roles and Responsibilities",
    "Details",
    "Training",
    "Related SOPs",
    "Background",
    "Timeline",
    "Agenda",
    "Goals",
    "Revision History",
];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks whose trimmed text has fewer characters are dropped.
    pub min_chunk_chars: usize,
    pub section_headers: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_chars: 1,
            section_headers: DEFAULT_SECTION_HEADERS.map(str::to_owned).to_vec(),
        }
    }
}

/// Section-aware splitter with a fixed-size sliding window fallback.
#[derive(Debug)]
pub struct SopSplitter {
    config: SplitterConfig,
    headers: Vec<(String, Regex)>,
}

impl SopSplitter {
    /// # Errors
    ///
    /// Returns an error if a header label cannot be compiled into a pattern.
    pub fn new(config: SplitterConfig) -> Result<Self, DocumentError> {
        let headers = config
            .section_headers
            .iter()
            .map(|h| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(h)))?;
                Ok((h.clone(), re))
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;
        Ok(Self { config, headers })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split by sections, falling back to fixed-size windows when section
    /// splitting produced nothing.
    #[must_use]
    pub fn split(&self, text: &str, metadata: &SopMetadata) -> Vec<Chunk> {
        let chunks = self.chunk_by_sections(text, metadata);
        if chunks.is_empty() {
            self.chunk_by_size(text, metadata)
        } else {
            chunks
        }
    }

    /// One chunk per header occurrence, running to the next occurrence.
    ///
    /// Every occurrence counts, so a label repeated in a table of contents and
    /// in the body yields two boundaries. Returns nothing when fewer than two
    /// occurrences are found.
    #[must_use]
    pub fn chunk_by_sections(&self, text: &str, metadata: &SopMetadata) -> Vec<Chunk> {
        let mut positions: Vec<(usize, &str)> = self
            .headers
            .iter()
            .flat_map(|(label, re)| {
                re.find_iter(text)
                    .map(move |m| (m.start(), label.as_str()))
            })
            .collect();

        if positions.len() < 2 {
            return Vec::new();
        }
        positions.sort_unstable();

        let prefix = metadata.context_prefix();
        positions
            .iter()
            .enumerate()
            .filter_map(|(i, &(start, label))| {
                let end = positions.get(i + 1).map_or(text.len(), |&(next, _)| next);
                self.make_chunk(&prefix, &text[start..end], metadata, label.to_owned())
            })
            .collect()
    }

    /// Sliding character window of `chunk_size` advancing by
    /// `chunk_size - chunk_overlap`, labelled `Chunk {n}`.
    #[must_use]
    pub fn chunk_by_size(&self, text: &str, metadata: &SopMetadata) -> Vec<Chunk> {
        let prefix = metadata.context_prefix();
        let mut chunks = Vec::new();
        for window in char_windows(text, self.config.chunk_size, self.config.chunk_overlap) {
            let label = format!("Chunk {}", chunks.len() + 1);
            if let Some(chunk) = self.make_chunk(&prefix, window, metadata, label) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    fn make_chunk(
        &self,
        prefix: &str,
        raw: &str,
        metadata: &SopMetadata,
        section_type: String,
    ) -> Option<Chunk> {
        let body = raw.trim();
        let char_count = body.chars().count();
        if char_count < self.config.min_chunk_chars {
            return None;
        }
        Some(Chunk {
            content: format!("{prefix}{body}"),
            metadata: ChunkMetadata::new(metadata, section_type, char_count),
        })
    }
}

/// Byte slices of `text` covering `size` characters each, stepping by
/// `size - overlap` characters (at least one).
fn char_windows(text: &str, size: usize, overlap: usize) -> Vec<&str> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + size).min(total);
        windows.push(&text[bounds[start]..bounds[end]]);
        start += step;
    }
    windows
}
