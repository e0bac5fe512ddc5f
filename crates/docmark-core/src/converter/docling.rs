//! External converter: the `docling` command line tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::Converter;
use crate::error::ConvertError;
use crate::format::DocumentFormat;

/// Exception lines docling's Python runtime prints when an optional extra is not installed
const MISSING_MODULE_MARKERS: &[&str] = &["ModuleNotFoundError", "No module named", "ImportError"];

/// Runs `docling --to md --output <dir> <file>` and reads back `<dir>/<stem>.md`.
///
/// The child inherits the process environment, so the cache workaround
/// variables set by the platform adapter reach docling's model downloader.
#[derive(Debug, Clone)]
pub struct DoclingConverter {
    program: PathBuf,
}

impl DoclingConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DoclingConverter {
    fn default() -> Self {
        Self::new("docling")
    }
}

#[async_trait]
impl Converter for DoclingConverter {
    fn name(&self) -> &'static str {
        "docling"
    }

    async fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ConvertError> {
        let output_dir = tempfile::tempdir()?;

        tracing::debug!(
            program = %self.program.display(),
            path = %path.display(),
            %format,
            "Spawning docling"
        );

        let output = Command::new(&self.program)
            .arg("--to")
            .arg("md")
            .arg("--output")
            .arg(output_dir.path())
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConvertError::missing_dependency(format!(
                    "'{}' was not found. Install docling (pip install docling) or switch to the native engine.",
                    self.program.display()
                )),
                _ => ConvertError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "docling exited with failure");
            return Err(classify_failure(&stderr));
        }

        read_markdown_output(output_dir.path(), path).await
    }
}

/// Map docling's stderr to a converter error.
pub fn classify_failure(stderr: &str) -> ConvertError {
    // Only the exception line itself counts, not traceback frames quoting source
    if let Some(line) = stderr
        .lines()
        .map(str::trim)
        .find(|line| MISSING_MODULE_MARKERS.iter().any(|m| line.starts_with(m)))
    {
        return ConvertError::missing_dependency(line);
    }

    let last_line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("docling exited without an error message");

    ConvertError::failed(last_line)
}

async fn read_markdown_output(output_dir: &Path, source: &Path) -> Result<String, ConvertError> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let expected = output_dir.join(format!("{}.md", stem));

    match tokio::fs::read_to_string(&expected).await {
        Ok(markdown) => return Ok(markdown),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    // Older docling releases sanitize the output name; take whatever .md it wrote
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            return Ok(tokio::fs::read_to_string(&path).await?);
        }
    }

    Err(ConvertError::failed("docling produced no Markdown output"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_missing_module() {
        let stderr = "Traceback (most recent call last):\n  File \"x.py\", line 1\nModuleNotFoundError: No module named 'pptx'\n";

        match classify_failure(stderr) {
            ConvertError::MissingDependency(msg) => {
                assert_eq!(msg, "ModuleNotFoundError: No module named 'pptx'")
            }
            other => panic!("Expected MissingDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_generic_failure_uses_last_line() {
        let stderr = "loading models\nRuntimeError: invalid PDF header\n\n";

        match classify_failure(stderr) {
            ConvertError::Failed(msg) => assert_eq!(msg, "RuntimeError: invalid PDF header"),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_traceback_frame_mentioning_import_error_is_generic_failure() {
        let stderr = "Traceback (most recent call last):\n  File \"docling/cli.py\", line 12, in <module>\n    except ImportError: pass\nValueError: page 3 has no content stream\n";

        match classify_failure(stderr) {
            ConvertError::Failed(msg) => assert_eq!(msg, "ValueError: page 3 has no content stream"),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_indented_import_error_line() {
        let stderr = "  ImportError: cannot import name 'PdfPipeline'\n";

        assert!(matches!(
            classify_failure(stderr),
            ConvertError::MissingDependency(msg) if msg == "ImportError: cannot import name 'PdfPipeline'"
        ));
    }

    #[test]
    fn test_classify_empty_stderr() {
        assert!(matches!(classify_failure(""), ConvertError::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_missing_dependency() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("doc.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let converter = DoclingConverter::new("docmark-test-no-such-docling-binary");
        let result = converter.convert(&file, DocumentFormat::Pdf).await;

        assert!(matches!(result, Err(ConvertError::MissingDependency(_))));
    }

    #[tokio::test]
    async fn test_reads_expected_output_file() {
        let out = tempfile::tempdir().unwrap();
        std::fs::write(out.path().join("report.md"), "# Report").unwrap();

        let markdown = read_markdown_output(out.path(), Path::new("/docs/report.pdf"))
            .await
            .unwrap();

        assert_eq!(markdown, "# Report");
    }

    #[tokio::test]
    async fn test_falls_back_to_any_markdown_output() {
        let out = tempfile::tempdir().unwrap();
        std::fs::write(out.path().join("renamed_output.md"), "body").unwrap();

        let markdown = read_markdown_output(out.path(), Path::new("/docs/My Report.pdf"))
            .await
            .unwrap();

        assert_eq!(markdown, "body");
    }

    #[tokio::test]
    async fn test_no_output_is_failure() {
        let out = tempfile::tempdir().unwrap();

        let result = read_markdown_output(out.path(), Path::new("/docs/report.pdf")).await;

        assert!(matches!(result, Err(ConvertError::Failed(_))));
    }
}
