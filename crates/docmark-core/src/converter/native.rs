//! In-process converter that needs no external tools.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::office::{docx_to_markdown, pptx_to_markdown};
use super::Converter;
use crate::error::ConvertError;
use crate::format::DocumentFormat;
use crate::pdf;

/// Converts with lopdf (PDF), html2md (HTML) and the OOXML readers (DOCX, PPTX).
///
/// Parsing is CPU-bound, so each call runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    /// Convert on the current thread
    pub fn convert_blocking(path: &Path, format: DocumentFormat) -> Result<String, ConvertError> {
        match format {
            DocumentFormat::Pdf => Ok(pdf::extract_pages(path)?.to_markdown()),
            DocumentFormat::Html => {
                let bytes = std::fs::read(path)?;
                Ok(html2md::parse_html(&String::from_utf8_lossy(&bytes)))
            }
            DocumentFormat::Docx => docx_to_markdown(path),
            DocumentFormat::Pptx => pptx_to_markdown(path),
        }
    }
}

#[async_trait]
impl Converter for NativeConverter {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ConvertError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::convert_blocking(&path, format))
            .await
            .map_err(|e| ConvertError::failed(format!("Conversion task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tests_support::create_test_pdf;

    #[tokio::test]
    async fn test_converts_pdf() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("hello.pdf");
        std::fs::write(&path, create_test_pdf(&["Hello World"])).unwrap();

        let markdown = NativeConverter
            .convert(&path, DocumentFormat::Pdf)
            .await
            .unwrap();

        assert!(markdown.contains("Hello") || markdown.contains("World"));
    }

    #[tokio::test]
    async fn test_converts_html_headings_and_lists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("page.htm");
        std::fs::write(
            &path,
            "<html><body><h1>Title</h1><p>Some <b>bold</b> text.</p><ul><li>one</li></ul></body></html>",
        )
        .unwrap();

        let markdown = NativeConverter
            .convert(&path, DocumentFormat::Html)
            .await
            .unwrap();

        assert!(markdown.contains("Title"), "got: {}", markdown);
        assert!(markdown.contains("**bold**"), "got: {}", markdown);
        assert!(markdown.contains("one"), "got: {}", markdown);
    }

    #[tokio::test]
    async fn test_corrupt_docx_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let result = NativeConverter.convert(&path, DocumentFormat::Docx).await;

        assert!(matches!(result, Err(ConvertError::Failed(_))));
    }
}
