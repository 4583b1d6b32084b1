use std::path::Path;
use std::pin::Pin;

use super::super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader};
use super::checked_source;

/// Extracts the text layer of a PDF, pages in order.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let (path, seed) = checked_source(&path, max_size).await?;

            // pdf-extract is synchronous and CPU bound.
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path).map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Pdf(format!("extraction aborted: {e}")))??;

            Ok(Document {
                content,
                metadata: seed.with_content_type("application/pdf"),
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentProcessor, ProcessorConfig};

    /// Uncompressed PDF with one Helvetica text line per entry, one page per
    /// slice.
    fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
        let font_id = 3 + 2 * pages.len();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len())
                    .map(|i| format!("{} 0 R", 3 + 2 * i))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages.len()
            ),
        ];
        for (i, lines) in pages.iter().enumerate() {
            let mut stream = String::new();
            for (n, line) in lines.iter().enumerate() {
                let y = 720 - 24 * n;
                stream.push_str(&format!("BT /F1 12 Tf 72 {y} Td ({line}) Tj ET\n"));
            }
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                4 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}endstream",
                stream.len()
            ));
        }
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_owned(),
        );

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = out.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            table.push_str(&format!("{offset:010} 00000 n \n"));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        ));
        out.extend_from_slice(table.as_bytes());
        out
    }

    fn write_sop_pdf(dir: &Path) -> std::path::PathBuf {
        let bytes = pdf_with_pages(&[
            &["SOP #: 4.12", "Purpose", "Describe patient parking at the clinic."],
            &["Procedures", "Validate the parking ticket at the front desk."],
        ]);
        let path = dir.join("4_12_parking.pdf");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn extracts_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sop_pdf(dir.path());

        let doc = PdfLoader::default().load(&path).await.unwrap();
        assert_eq!(doc.metadata.content_type, "application/pdf");
        let first = doc.content.find("Describe patient parking").unwrap();
        let second = doc.content.find("Validate the parking ticket").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn process_file_chunks_a_pdf_with_context_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sop_pdf(dir.path());

        let processor = DocumentProcessor::new(ProcessorConfig::default()).unwrap();
        let chunks = processor.process_file(&path).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.section_type, "Purpose");
        assert_eq!(chunks[1].metadata.section_type, "Procedures");
        for chunk in &chunks {
            assert!(chunk.content.starts_with("SOP 4.12: 4 12 parking\n\n"));
            assert_eq!(chunk.metadata.filename, "4_12_parking.pdf");
        }
        assert!(chunks[1].content.contains("front desk"));
    }

    #[tokio::test]
    async fn corrupt_pdf_is_a_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        std::fs::write(&file, b"%PDF-1.4\nthis is not a real pdf").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::Pdf(_))));
    }

    #[tokio::test]
    async fn missing_pdf_is_io_error() {
        let result = PdfLoader::default()
            .load(Path::new("/nonexistent/sop.pdf"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[test]
    fn supports_pdf_only() {
        let loader = PdfLoader::default();
        assert!(loader.supports(Path::new("4_12_parking.PDF")));
        assert!(!loader.supports(Path::new("notes.txt")));
    }
}
