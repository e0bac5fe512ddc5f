//! Supported input formats and extension detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions accepted by the file dialog and the drop target.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx", "html", "htm"];

/// Document formats the pipeline can convert to Markdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Html,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Detect the format of a path. Paths without an extension are unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word",
            Self::Pptx => "PowerPoint",
            Self::Html => "HTML",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::Pptx => &["pptx"],
            Self::Html => &["html", "htm"],
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A named group of extensions for the open-file dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

/// Filters shown in the open-file dialog, most general first.
pub fn dialog_filters() -> Vec<DialogFilter> {
    vec![
        DialogFilter {
            name: "All Supported Files",
            extensions: SUPPORTED_EXTENSIONS,
        },
        DialogFilter {
            name: "PDF Files",
            extensions: DocumentFormat::Pdf.extensions(),
        },
        DialogFilter {
            name: "Word Documents",
            extensions: DocumentFormat::Docx.extensions(),
        },
        DialogFilter {
            name: "PowerPoint Files",
            extensions: DocumentFormat::Pptx.extensions(),
        },
        DialogFilter {
            name: "HTML Files",
            extensions: DocumentFormat::Html.extensions(),
        },
    ]
}
