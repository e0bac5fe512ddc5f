use std::path::Path;

use crate::error::ConvertError;

/// Text pulled out of a PDF, one entry per page
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    /// Extracted text per page, in page order
    pub pages: Vec<String>,
}

impl ExtractedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Render pages as Markdown paragraphs separated by blank lines.
    /// Pages with no text are skipped.
    pub fn to_markdown(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.trim())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Extract text from a PDF file
pub fn extract_pages(path: &Path) -> Result<ExtractedPdf, ConvertError> {
    let pdf_bytes = std::fs::read(path)?;
    extract_pages_from_bytes(&pdf_bytes)
}

/// Extract text from PDF bytes already in memory
pub fn extract_pages_from_bytes(pdf_bytes: &[u8]) -> Result<ExtractedPdf, ConvertError> {
    let doc = lopdf::Document::load_mem(pdf_bytes)?;

    let mut page_numbers: Vec<u32> = doc.get_pages().keys().cloned().collect();
    page_numbers.sort();

    let pages: Vec<String> = page_numbers
        .iter()
        .map(|page_num| doc.extract_text(&[*page_num]).unwrap_or_default())
        .collect();

    tracing::debug!(
        "Extracted {} chars from {} pages",
        pages.iter().map(String::len).sum::<usize>(),
        pages.len()
    );

    Ok(ExtractedPdf { pages })
}
