//! Conversion pipeline controller.
//!
//! ```text
//! dialog path ──┐
//!               ├─► submit_path ─► detect format ─► pre-flight ─► converter ─► apply if current
//! dropped refs ─┘        │                                                        │
//!   (resolve_dropped)    └── generation += 1, status Converting          status Success/Error
//! ```
//!
//! Every submission bumps the generation counter. A finished conversion is
//! applied only if its generation is still the current one, so a slow
//! earlier request can never overwrite the display of a newer one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::clipboard::{ClipboardSink, MemoryClipboard};
use crate::converter::Converter;
use crate::error::ConvertError;
use crate::format::{DocumentFormat, SUPPORTED_EXTENSIONS};
use crate::platform::{
    is_remote_reference, process_environment_setup, Environment, EnvironmentSetup,
    PlatformAdapter, ProcessEnvironment,
};
use crate::types::{
    display_name, ApplicationStatus, ConversionRequest, ConversionResult, CopyOutcome, ErrorInfo,
    FailureCause, StatusSnapshot,
};
use crate::{NoOpEmitter, StatusEmitter};

pub const READY_MESSAGE: &str = "Ready. Select a file or drag it here.";

/// Windows `ERROR_PRIVILEGE_NOT_HELD`, raised when creating symlinks without rights
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

#[derive(Debug)]
struct DisplayState {
    generation: u64,
    status: ApplicationStatus,
    message: String,
    markdown: Option<String>,
    error: Option<ErrorInfo>,
    file_name: Option<String>,
    updated_at: DateTime<Utc>,
}

impl DisplayState {
    fn new() -> Self {
        Self {
            generation: 0,
            status: ApplicationStatus::Ready,
            message: READY_MESSAGE.to_string(),
            markdown: None,
            error: None,
            file_name: None,
            updated_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            message: self.message.clone(),
            markdown: self.markdown.clone(),
            error: self.error.clone(),
            generation: self.generation,
            file_name: self.file_name.clone(),
            can_copy: self.copyable().is_some(),
            updated_at: self.updated_at,
        }
    }

    fn copyable(&self) -> Option<&str> {
        match (self.status, self.markdown.as_deref()) {
            (ApplicationStatus::Success, Some(markdown)) if !markdown.trim().is_empty() => {
                Some(markdown)
            }
            _ => None,
        }
    }
}

/// Drives file submissions through the converter and owns the displayed result
pub struct ConversionController {
    converter: Arc<dyn Converter>,
    platform: Arc<dyn PlatformAdapter>,
    environment: Arc<dyn Environment>,
    env_setup: Arc<EnvironmentSetup>,
    clipboard: Arc<dyn ClipboardSink>,
    emitter: Arc<dyn StatusEmitter>,
    timeout: Option<Duration>,
    state: RwLock<DisplayState>,
}

impl ConversionController {
    /// Controller using the real process environment, an in-memory clipboard
    /// and no status listener.
    pub fn new(converter: Arc<dyn Converter>, platform: Arc<dyn PlatformAdapter>) -> Self {
        Self {
            converter,
            platform,
            environment: Arc::new(ProcessEnvironment),
            env_setup: process_environment_setup(),
            clipboard: Arc::new(MemoryClipboard::default()),
            emitter: Arc::new(NoOpEmitter),
            timeout: None,
            state: RwLock::new(DisplayState::new()),
        }
    }

    pub fn with_environment(
        mut self,
        environment: Arc<dyn Environment>,
        setup: Arc<EnvironmentSetup>,
    ) -> Self {
        self.environment = environment;
        self.env_setup = setup;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn StatusEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn converter_name(&self) -> &'static str {
        self.converter.name()
    }

    pub fn platform_name(&self) -> &'static str {
        self.platform.name()
    }

    /// Apply the platform's environment workaround now instead of on the first
    /// conversion. Safe to call any number of times.
    pub fn prepare_environment(&self) {
        self.env_setup
            .ensure(self.platform.as_ref(), self.environment.as_ref());
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn status(&self) -> ApplicationStatus {
        self.state.read().await.status
    }

    /// Convert the file at `path` and display the result.
    ///
    /// Blank paths (e.g. a cancelled dialog) are ignored. The outcome is
    /// observed through [`snapshot`](Self::snapshot) and the status emitter.
    pub async fn submit_path(&self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            tracing::warn!("Ignoring submission with an empty path");
            return;
        }

        let source_path = PathBuf::from(path);
        let generation = self.begin(display_name(&source_path)).await;
        tracing::info!(generation, path = %source_path.display(), "Conversion requested");

        let result = self.run(source_path, generation).await;
        self.finish(generation, result).await;
    }

    /// Handle a drag-and-drop. Only the first reference is converted.
    pub async fn submit_drop(&self, references: &[String]) {
        let Some(first) = references.first() else {
            tracing::debug!("Drop event without files");
            return;
        };

        if references.len() > 1 {
            tracing::info!(
                ignored = references.len() - 1,
                "Multiple files dropped, converting only the first"
            );
        }

        if is_remote_reference(first) {
            let generation = self.begin(first.clone()).await;
            let result = ConversionResult::failure(
                FailureCause::NotFound,
                format!("Cannot handle non-local file URL: {}", first),
            );
            self.finish(generation, result).await;
            return;
        }

        let path = self.platform.resolve_dropped(first);
        self.submit_path(&path.to_string_lossy()).await;
    }

    /// Copy the displayed Markdown to the clipboard.
    /// Without a successful result this does nothing.
    pub async fn copy_result(&self) -> CopyOutcome {
        let markdown = {
            let state = self.state.read().await;
            match state.copyable() {
                Some(markdown) => markdown.to_string(),
                None => return CopyOutcome::NothingToCopy,
            }
        };

        match self.clipboard.set_text(&markdown) {
            Ok(()) => {
                let chars = markdown.chars().count();
                tracing::info!(chars, "Markdown copied to clipboard");
                CopyOutcome::Copied { chars }
            }
            Err(e) => {
                tracing::error!("Clipboard copy failed: {}", e);
                CopyOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Start a new request: bump the generation, show Converting, clear the display.
    ///
    /// Status is emitted while the write guard is held, so listeners see
    /// events in generation order.
    async fn begin(&self, file_name: String) -> u64 {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.status = ApplicationStatus::Converting;
        state.message = format!("Converting '{}'...", file_name);
        state.markdown = None;
        state.error = None;
        state.file_name = Some(file_name);
        state.updated_at = Utc::now();

        self.emitter.emit_status(&state.snapshot());
        state.generation
    }

    /// Apply a finished result if it still belongs to the current request.
    async fn finish(&self, generation: u64, result: ConversionResult) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "Discarding stale conversion result"
            );
            return false;
        }

        let name = state.file_name.clone().unwrap_or_default();
        match result {
            ConversionResult::Success { markdown } => {
                tracing::info!(generation, chars = markdown.len(), "Conversion succeeded");
                state.status = ApplicationStatus::Success;
                state.message = format!("Successfully converted '{}'!", name);
                state.markdown = Some(markdown);
                state.error = None;
            }
            ConversionResult::Failure { message, cause } => {
                tracing::warn!(generation, ?cause, "Conversion failed: {}", message);
                state.status = ApplicationStatus::Error;
                state.message = format!("Conversion failed ({}).", cause.label());
                state.markdown = None;
                state.error = Some(ErrorInfo { cause, message });
            }
        }
        state.updated_at = Utc::now();

        self.emitter.emit_status(&state.snapshot());
        true
    }

    async fn run(&self, source_path: PathBuf, generation: u64) -> ConversionResult {
        let file_name = display_name(&source_path);

        let Some(format) = DocumentFormat::from_path(&source_path) else {
            return ConversionResult::failure(
                FailureCause::UnsupportedFormat,
                format!(
                    "Unsupported file type: '{}'.\n\nSupported types: {}",
                    file_name,
                    SUPPORTED_EXTENSIONS
                        .iter()
                        .map(|ext| format!(".{}", ext))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
        };

        if let Err(failure) = preflight(&source_path).await {
            return failure;
        }

        let request = ConversionRequest {
            source_path,
            detected_format: format,
            generation,
        };

        self.prepare_environment();

        tracing::debug!(
            generation,
            %format,
            converter = self.converter.name(),
            "Invoking converter"
        );

        let started = Instant::now();
        let conversion = self
            .converter
            .convert(&request.source_path, request.detected_format);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, conversion)
                .await
                .unwrap_or_else(|_| Err(ConvertError::Timeout(limit))),
            None => conversion.await,
        };

        tracing::debug!(
            generation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Converter finished"
        );

        map_outcome(&request, outcome)
    }
}

/// Check existence and readability before handing the file to the converter.
async fn preflight(path: &Path) -> Result<(), ConversionResult> {
    let not_found = || {
        ConversionResult::failure(
            FailureCause::NotFound,
            format!("File not found: {}", path.display()),
        )
    };
    let permission_denied = || {
        ConversionResult::failure(
            FailureCause::PermissionDenied,
            format!("Permission denied: Cannot read file\n{}", path.display()),
        )
    };

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            return Err(ConversionResult::failure(
                FailureCause::NotFound,
                format!("Not a file: {}", path.display()),
            ))
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(permission_denied())
        }
        Err(_) => return Err(not_found()),
    }

    match tokio::fs::File::open(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(permission_denied()),
        Err(_) => Err(not_found()),
    }
}

/// Map the converter's answer to a displayable result. Never panics, never propagates.
fn map_outcome(
    request: &ConversionRequest,
    outcome: Result<String, ConvertError>,
) -> ConversionResult {
    let name = request.file_name();

    let err = match outcome {
        Ok(markdown) if markdown.trim().is_empty() => {
            return ConversionResult::failure(
                FailureCause::ConversionError,
                format!(
                    "Conversion resulted in empty content for '{}'. The document might be empty or unsupported.",
                    name
                ),
            );
        }
        Ok(markdown) => return ConversionResult::Success { markdown },
        Err(e) => e,
    };

    tracing::error!(
        generation = request.generation,
        format = %request.detected_format,
        "Error during conversion: {:?}",
        err
    );

    match err {
        ConvertError::MissingDependency(details) => ConversionResult::failure(
            FailureCause::MissingDependency,
            format!(
                "Failed to convert '{}'.\nA required dependency might be missing.\n\nDetails: {}\n\nCheck the converter installation and its requirements for {} files.",
                name, details, request.detected_format
            ),
        ),
        ConvertError::Io(e) if e.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD) => {
            ConversionResult::failure(FailureCause::ConversionError, privilege_message(&name))
        }
        ConvertError::Io(e) => match e.kind() {
            std::io::ErrorKind::NotFound => ConversionResult::failure(
                FailureCause::NotFound,
                format!("File not found while converting '{}': {}", name, e),
            ),
            std::io::ErrorKind::PermissionDenied => ConversionResult::failure(
                FailureCause::PermissionDenied,
                format!("Permission denied while converting '{}': {}", name, e),
            ),
            _ => ConversionResult::failure(
                FailureCause::ConversionError,
                format!(
                    "Failed to convert '{}' due to an OS error.\n\nDetails: {}\n\nCheck file access permissions and ensure the file is not open elsewhere.",
                    name, e
                ),
            ),
        },
        ConvertError::Timeout(limit) => ConversionResult::failure(
            FailureCause::ConversionError,
            format!(
                "Failed to convert '{}': conversion timed out after {} seconds.",
                name,
                limit.as_secs()
            ),
        ),
        ConvertError::Failed(details) => ConversionResult::failure(
            FailureCause::ConversionError,
            format!("Failed to convert '{}'.\n\nDetails: {}", name, details),
        ),
    }
}

fn privilege_message(name: &str) -> String {
    let cache_dir = dirs::home_dir()
        .map(|home| home.join(".cache").join("huggingface").display().to_string())
        .unwrap_or_else(|| "~/.cache/huggingface".to_string());

    format!(
        "Failed to convert '{}'.\n\nA required file operation failed due to insufficient privileges (WinError 1314).\n\nTroubleshooting:\n- Ensure Developer Mode is enabled on Windows.\n- Try running the application as Administrator.\n- Check permissions for the cache folder:\n  {}",
        name, cache_dir
    )
}
