use std::path::{Path, PathBuf};

use super::metadata::extract_metadata;
use super::splitter::{SopSplitter, SplitterConfig};
use super::{Chunk, DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, TextLoader};

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub splitter: SplitterConfig,
    /// Documents whose trimmed text has fewer characters are skipped.
    pub min_document_chars: usize,
    pub max_file_size: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            splitter: SplitterConfig::default(),
            min_document_chars: 1,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Turns a directory of SOP files into retrieval chunks.
pub struct DocumentProcessor {
    splitter: SopSplitter,
    loaders: Vec<Box<dyn DocumentLoader>>,
    min_document_chars: usize,
}

impl DocumentProcessor {
    /// # Errors
    ///
    /// Returns an error if a section header pattern is invalid.
    pub fn new(config: ProcessorConfig) -> Result<Self, DocumentError> {
        let mut loaders: Vec<Box<dyn DocumentLoader>> = vec![Box::new(TextLoader {
            max_file_size: config.max_file_size,
        })];
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(super::PdfLoader {
            max_file_size: config.max_file_size,
        }));

        Ok(Self {
            splitter: SopSplitter::new(config.splitter)?,
            loaders,
            min_document_chars: config.min_document_chars,
        })
    }

    #[must_use]
    pub fn splitter(&self) -> &SopSplitter {
        &self.splitter
    }

    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.loaders.iter().any(|l| l.supports(path))
    }

    /// Load the full text of one source file.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for unknown extensions and
    /// the loader's error when the file cannot be read.
    pub async fn extract_text(&self, path: &Path) -> Result<Document, DocumentError> {
        let loader = self
            .loaders
            .iter()
            .find(|l| l.supports(path))
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.display().to_string()))?;
        loader.load(path).await
    }

    /// Chunk one file. Returns no chunks when the document is below the
    /// minimum length.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Unreadable`] wrapping the underlying failure.
    pub async fn process_file(&self, path: &Path) -> Result<Vec<Chunk>, DocumentError> {
        let document = self.extract_text(path).await.map_err(|e| e.at(path))?;
        let name = &document.metadata.filename;

        if document.content.trim().chars().count() < self.min_document_chars {
            tracing::info!("  -> Skipped {name} (too short)");
            return Ok(Vec::new());
        }

        let metadata = extract_metadata(&document.content, name);
        let chunks = self.splitter.split(&document.content, &metadata);
        tracing::info!("  -> Created {} chunks", chunks.len());
        Ok(chunks)
    }

    /// Process every supported file directly inside `dir`, in file name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or any supported
    /// file cannot be read.
    pub async fn process_directory(&self, dir: &Path) -> Result<Vec<Chunk>, DocumentError> {
        let files = self.list_sources(dir).await.map_err(|e| e.at(dir))?;
        let mut all_chunks = Vec::new();

        for path in &files {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            tracing::info!("Processing: {name}");
            all_chunks.extend(self.process_file(path).await?);
        }

        tracing::info!(
            "Processed {} files into {} chunks",
            files.len(),
            all_chunks.len()
        );
        Ok(all_chunks)
    }

    async fn list_sources(&self, dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if self.supports(&path) {
                files.push(path);
            } else {
                tracing::debug!("ignoring {}", path.display());
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(ProcessorConfig::default()).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn process_file_uses_sections_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "2_1_consent.txt",
            "Standard Operating Procedure\nInformed Consent\nPurpose\nObtain consent.\nScope\nAll studies.",
        );

        let chunks = processor().process_file(&path).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.sop_number, "2.1");
        assert_eq!(chunks[0].metadata.title, "Informed Consent");
        assert!(chunks[0].content.starts_with("SOP 2.1: Informed Consent\n\nPurpose"));
    }

    #[tokio::test]
    async fn process_file_falls_back_to_size_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "memo.txt", &"word ".repeat(400));

        let chunks = processor().process_file(&path).await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata.section_type, "Chunk 1");
        assert_eq!(chunks[0].metadata.title, "memo.txt");
    }

    #[tokio::test]
    async fn blank_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "blank.txt", "  \n\t ");

        let chunks = processor().process_file(&path).await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn min_document_chars_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "short.txt", "tiny");
        let processor = DocumentProcessor::new(ProcessorConfig {
            min_document_chars: 10,
            ..ProcessorConfig::default()
        })
        .unwrap();

        assert!(processor.process_file(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "sheet.xlsx", "data");

        let err = processor().process_file(&path).await.unwrap_err();
        match err {
            DocumentError::Unreadable { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(*source, DocumentError::UnsupportedFormat(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_is_processed_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_second.txt", "second document body");
        write(dir.path(), "a_first.txt", "first document body");
        write(dir.path(), "ignored.csv", "x,y");
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let chunks = processor().process_directory(dir.path()).await.unwrap();
        let files: Vec<_> = chunks.iter().map(|c| c.metadata.filename.as_str()).collect();
        assert_eq!(files, ["a_first.txt", "b_second.txt"]);
    }

    #[tokio::test]
    async fn missing_directory_is_unreadable() {
        let err = processor()
            .process_directory(Path::new("/nonexistent/sops"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn unreadable_file_fails_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "fine");
        write(dir.path(), "b.txt", "too big for the limit");
        let processor = DocumentProcessor::new(ProcessorConfig {
            max_file_size: 10,
            ..ProcessorConfig::default()
        })
        .unwrap();

        let err = processor.process_directory(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("b.txt"));
    }
}
