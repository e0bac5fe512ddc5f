//! DocuMark Core - document to Markdown conversion pipeline
//!
//! This crate contains everything except the desktop shell:
//! - Format detection for PDF, Word, PowerPoint and HTML files
//! - Converters (external `docling` tool, built-in readers)
//! - Platform adapters (Windows cache workaround, macOS drop paths)
//! - The conversion controller with its status and generation tracking
//! - Configuration and user settings

pub mod clipboard;
pub mod config;
pub mod controller;
pub mod converter;
pub mod error;
pub mod format;
pub mod pdf;
pub mod platform;
pub mod types;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use clipboard::{ClipboardSink, MemoryClipboard};
pub use config::{Config, ConverterEngine, Settings};
pub use controller::{ConversionController, READY_MESSAGE};
pub use converter::{build_converter, Converter, DoclingConverter, NativeConverter};
pub use error::{ClipboardError, ConvertError};
pub use format::{dialog_filters, DialogFilter, DocumentFormat, SUPPORTED_EXTENSIONS};
pub use platform::PlatformAdapter;
pub use types::{
    ApplicationStatus, ConversionRequest, ConversionResult, CopyOutcome, ErrorInfo, FailureCause,
    StatusSnapshot,
};

/// Receives every status change of the controller.
///
/// The desktop shell forwards these to the frontend.
pub trait StatusEmitter: Send + Sync {
    fn emit_status(&self, snapshot: &StatusSnapshot);
}

/// No-op implementation for headless use and tests
pub struct NoOpEmitter;

impl StatusEmitter for NoOpEmitter {
    fn emit_status(&self, _snapshot: &StatusSnapshot) {}
}

/// Application state shared across Tauri commands
pub struct AppState {
    pub config: Config,
    /// Settings as last loaded or saved. The controller picks up changes on next start.
    pub settings: Arc<RwLock<Settings>>,
    pub controller: Arc<ConversionController>,
}

impl AppState {
    /// Build the controller from the saved settings and the detected platform.
    pub fn new(
        config: Config,
        emitter: Arc<dyn StatusEmitter>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let settings = Settings::load(&config.settings_file);
        Self::with_settings(config, settings, emitter, clipboard)
    }

    pub fn with_settings(
        config: Config,
        settings: Settings,
        emitter: Arc<dyn StatusEmitter>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let controller = ConversionController::new(build_converter(&settings), platform::detect())
            .with_emitter(emitter)
            .with_clipboard(clipboard)
            .with_timeout(converter::timeout_from_settings(&settings));

        tracing::info!(
            converter = controller.converter_name(),
            platform = controller.platform_name(),
            "AppState initialized"
        );

        Self {
            config,
            settings: Arc::new(RwLock::new(settings)),
            controller: Arc::new(controller),
        }
    }

    /// Persist settings and make them the current in-memory copy
    pub async fn save_settings(&self, settings: Settings) -> anyhow::Result<()> {
        let mut current = self.settings.write().await;
        settings.save(&self.config.settings_file)?;
        *current = settings;
        Ok(())
    }
}
