use std::collections::HashMap;

use sopqa_llm::embedding::DEFAULT_BATCH_SIZE;
use sopqa_llm::{EmbeddingGenerator, LlmError, LlmProvider};

use crate::document::Chunk;
use crate::search::{IndexManager, IndexRecord, SearchError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("upload failed: {0}")]
    Search(#[from] SearchError),
}

/// Embeds chunks and uploads them as index records.
pub struct IndexIngestor<P> {
    embedder: EmbeddingGenerator<P>,
    manager: IndexManager,
    batch_size: usize,
}

impl<P: LlmProvider> IndexIngestor<P> {
    #[must_use]
    pub fn new(embedder: EmbeddingGenerator<P>, manager: IndexManager) -> Self {
        Self {
            embedder,
            manager,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn manager(&self) -> &IndexManager {
        &self.manager
    }

    /// Embed every chunk's content and upload the records. Returns the
    /// number of records uploaded.
    ///
    /// Records are upserted by `{file}_{ordinal}` key and nothing is deleted,
    /// so when a file now yields fewer chunks its old trailing records stay
    /// searchable. Recreate the index before a full reload to drop them.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or upload fails. Nothing is uploaded
    /// when embedding fails.
    pub async fn ingest(&self, chunks: &[Chunk]) -> Result<usize, IngestError> {
        if chunks.is_empty() {
            tracing::info!("no chunks to ingest");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        tracing::info!("Generating embeddings for {} chunks", texts.len());
        let vectors = self.embedder.embed_batch(&texts, self.batch_size).await?;

        let records = to_records(chunks, vectors);
        Ok(self.manager.upload_documents(records).await?)
    }
}

/// Pair chunks with their vectors; ordinals count per source file.
fn to_records(chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Vec<IndexRecord> {
    let mut ordinals: HashMap<&str, usize> = HashMap::new();
    chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| {
            let ordinal = ordinals.entry(chunk.metadata.filename.as_str()).or_default();
            let record = IndexRecord::from_chunk(chunk, *ordinal, vector);
            *ordinal += 1;
            record
        })
        .collect()
}
