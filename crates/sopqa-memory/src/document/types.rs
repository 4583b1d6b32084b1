use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Canonical path of the source file.
    pub source: String,
    pub filename: String,
    pub content_type: String,
}

/// Raw text of one source file.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Best-effort SOP attributes; empty strings when a pattern does not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopMetadata {
    pub filename: String,
    pub sop_number: String,
    pub version: String,
    pub title: String,
    pub effective_date: String,
}

impl SopMetadata {
    /// Prefix carried by every chunk so it reads on its own when retrieved.
    #[must_use]
    pub fn context_prefix(&self) -> String {
        format!("SOP {}: {}\n\n", self.sop_number, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub sop_number: String,
    pub version: String,
    pub title: String,
    pub effective_date: String,
    pub section_type: String,
    /// Characters of section text, excluding the context prefix.
    pub char_count: usize,
}

impl ChunkMetadata {
    #[must_use]
    pub fn new(sop: &SopMetadata, section_type: impl Into<String>, char_count: usize) -> Self {
        Self {
            filename: sop.filename.clone(),
            sop_number: sop.sop_number.clone(),
            version: sop.version.clone(),
            title: sop.title.clone(),
            effective_date: sop.effective_date.clone(),
            section_type: section_type.into(),
            char_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}
