//! Error types raised by converters and clipboard sinks.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while turning a document into Markdown
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A tool or optional component needed for this format is not installed
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The converter ran but could not produce Markdown
    #[error("{0}")]
    Failed(String),

    #[error("conversion timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ConvertError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::MissingDependency(message.into())
    }
}

impl From<lopdf::Error> for ConvertError {
    fn from(err: lopdf::Error) -> Self {
        Self::Failed(format!("Failed to parse PDF: {}", err))
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Failed(format!("Failed to open Office archive: {}", err))
    }
}

impl From<quick_xml::Error> for ConvertError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Failed(format!("Malformed document XML: {}", err))
    }
}

/// Errors writing to the system clipboard
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}
