mod text;
#[cfg(feature = "pdf")]
mod pdf;

pub use text::TextLoader;
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;

use std::path::Path;

use super::{DocumentError, DocumentMetadata};

/// Canonicalize `path` and reject files above `max_size` bytes.
pub(super) async fn checked_source(
    path: &Path,
    max_size: u64,
) -> Result<(std::path::PathBuf, DocumentMetadataSeed), DocumentError> {
    let path = tokio::fs::canonicalize(path).await?;
    let meta = tokio::fs::metadata(&path).await?;
    if meta.len() > max_size {
        return Err(DocumentError::FileTooLarge(meta.len()));
    }
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seed = DocumentMetadataSeed {
        source: path.display().to_string(),
        filename,
    };
    Ok((path, seed))
}

pub(super) struct DocumentMetadataSeed {
    source: String,
    filename: String,
}

impl DocumentMetadataSeed {
    pub(super) fn with_content_type(self, content_type: &str) -> DocumentMetadata {
        DocumentMetadata {
            source: self.source,
            filename: self.filename,
            content_type: content_type.to_owned(),
        }
    }
}
