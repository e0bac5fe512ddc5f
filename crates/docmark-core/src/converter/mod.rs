//! Conversion engines.
//!
//! The controller only sees the [`Converter`] trait:
//! - [`DoclingConverter`] shells out to the external `docling` tool (default)
//! - [`NativeConverter`] converts in-process with lopdf, html2md and the OOXML readers

mod docling;
mod native;
mod office;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ConverterEngine, Settings};
use crate::error::ConvertError;
use crate::format::DocumentFormat;

pub use docling::{classify_failure, DoclingConverter};
pub use native::NativeConverter;
pub use office::{docx_to_markdown, pptx_to_markdown};

/// Turns a document on disk into Markdown text
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short engine name used in logs
    fn name(&self) -> &'static str;

    async fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ConvertError>;
}

/// Build the converter selected in settings
pub fn build_converter(settings: &Settings) -> Arc<dyn Converter> {
    match settings.engine {
        ConverterEngine::Docling => Arc::new(DoclingConverter::new(&settings.docling_program)),
        ConverterEngine::Native => Arc::new(NativeConverter),
    }
}

/// Conversion timeout from settings. `None` means unbounded.
pub fn timeout_from_settings(settings: &Settings) -> Option<Duration> {
    settings
        .timeout_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
