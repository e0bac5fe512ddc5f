//! Request, result and status types shared by the controller and the UI.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::DocumentFormat;

/// A single conversion, created on file selection or drop.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub detected_format: DocumentFormat,
    /// Generation this request was submitted under
    pub generation: u64,
}

impl ConversionRequest {
    pub fn file_name(&self) -> String {
        display_name(&self.source_path)
    }
}

/// Why a conversion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    NotFound,
    PermissionDenied,
    UnsupportedFormat,
    MissingDependency,
    ConversionError,
}

impl FailureCause {
    /// Short label used in the status line
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "File Not Found",
            Self::PermissionDenied => "Permission Denied",
            Self::UnsupportedFormat => "Unsupported Format",
            Self::MissingDependency => "Missing Dependency",
            Self::ConversionError => "Conversion Error",
        }
    }
}

/// Outcome of one request. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { markdown: String },
    Failure { message: String, cause: FailureCause },
}

impl ConversionResult {
    pub fn failure(cause: FailureCause, message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            cause,
        }
    }
}

/// Process-wide application status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Ready,
    Converting,
    Success,
    Error,
}

/// Error details for the display area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub cause: FailureCause,
    pub message: String,
}

/// Serializable view of the controller state, pushed to the frontend
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: ApplicationStatus,
    pub message: String,
    pub markdown: Option<String>,
    pub error: Option<ErrorInfo>,
    pub generation: u64,
    pub file_name: Option<String>,
    pub can_copy: bool,
    pub updated_at: DateTime<Utc>,
}

/// Result of a copy-to-clipboard action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied { chars: usize },
    NothingToCopy,
    Failed { message: String },
}

impl CopyOutcome {
    /// Transient notice shown after the copy button is pressed
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Copied { .. } => "Markdown copied to clipboard!",
            Self::NothingToCopy => "Nothing to copy.",
            Self::Failed { .. } => "Clipboard copy failed.",
        }
    }
}

pub(crate) fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
