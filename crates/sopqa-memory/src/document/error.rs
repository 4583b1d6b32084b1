use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("invalid section header pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<DocumentError>,
    },
}

impl DocumentError {
    pub(crate) fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Unreadable { .. } => self,
            other => Self::Unreadable {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
