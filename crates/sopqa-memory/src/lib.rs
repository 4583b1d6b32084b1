//! SOP document processing, chunking and Azure AI Search index management.

pub mod document;
pub mod ingest;
pub mod search;

pub use document::{Chunk, DocumentError, DocumentProcessor, ProcessorConfig, SopMetadata};
pub use ingest::{IndexIngestor, IngestError};
pub use search::{IndexManager, SearchError, SearchStore};
