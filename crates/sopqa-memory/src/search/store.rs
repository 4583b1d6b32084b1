use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::error::SearchError;
use super::schema::{IndexSchema, SELECT_FIELDS};
use crate::document::Chunk;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Wire form of one chunk in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub content: String,
    pub sop_number: String,
    pub title: String,
    pub section_type: String,
    pub version: String,
    pub filename: String,
    pub effective_date: String,
    pub content_vector: Vec<f32>,
}

impl IndexRecord {
    /// `ordinal` is the chunk's position among all chunks of its file.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, ordinal: usize, content_vector: Vec<f32>) -> Self {
        let meta = &chunk.metadata;
        Self {
            id: record_key(&meta.filename, ordinal),
            content: chunk.content.clone(),
            sop_number: meta.sop_number.clone(),
            title: meta.title.clone(),
            section_type: meta.section_type.clone(),
            version: meta.version.clone(),
            filename: meta.filename.clone(),
            effective_date: meta.effective_date.clone(),
            content_vector,
        }
    }
}

/// Stable document key so re-ingesting a file replaces its records.
#[must_use]
pub fn record_key(filename: &str, ordinal: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(filename.as_bytes());
    hasher.update(&[0]);
    hasher.update(&(ordinal as u64).to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Keyword plus vector query against the content vector field.
#[derive(Debug, Clone)]
pub struct HybridQuery {
    pub text: String,
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub select: Vec<String>,
}

impl HybridQuery {
    #[must_use]
    pub fn new(text: impl Into<String>, vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            text: text.into(),
            vector,
            top_k,
            select: SELECT_FIELDS.map(str::to_owned).to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f64,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SearchHit {
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

/// One search index, addressed by name.
pub trait SearchStore: Send + Sync {
    fn index_name(&self) -> &str;

    /// Create the index or replace its definition.
    fn create_index(&self, schema: &IndexSchema) -> BoxFuture<'_, Result<(), SearchError>>;

    fn delete_index(&self) -> BoxFuture<'_, Result<(), SearchError>>;

    /// Upsert records by key.
    fn upload(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<(), SearchError>>;

    /// Hits in descending relevance, at most `query.top_k`.
    fn hybrid_search(&self, query: HybridQuery)
    -> BoxFuture<'_, Result<Vec<SearchHit>, SearchError>>;

    fn document_count(&self) -> BoxFuture<'_, Result<u64, SearchError>>;
}
