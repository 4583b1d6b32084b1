pub mod error;
pub mod loader;
pub mod metadata;
pub mod processor;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::TextLoader;
pub use metadata::extract_metadata;
pub use processor::{DocumentProcessor, ProcessorConfig};
pub use splitter::{DEFAULT_SECTION_HEADERS, SopSplitter, SplitterConfig};
pub use types::{Chunk, ChunkMetadata, Document, DocumentMetadata, SopMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &std::path::Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>,
    >;

    fn supported_extensions(&self) -> &[&str];

    fn supports(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.supported_extensions()
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}
