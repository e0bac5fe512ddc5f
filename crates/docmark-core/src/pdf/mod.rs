mod extractor;

pub use extractor::{extract_pages, extract_pages_from_bytes, ExtractedPdf};

#[cfg(test)]
pub(crate) use extractor::tests as tests_support;
