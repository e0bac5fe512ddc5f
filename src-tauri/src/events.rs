//! Bridges between the core controller and the Tauri window.

use docmark_core::{AppState, ClipboardError, ClipboardSink, StatusEmitter, StatusSnapshot};
use serde::Serialize;
use tauri::{AppHandle, DragDropEvent, Emitter, Manager, Runtime};
use tauri_plugin_clipboard_manager::ClipboardExt;

pub const CONVERSION_STATUS_EVENT: &str = "conversion-status";
pub const STATUS_NOTICE_EVENT: &str = "status-notice";
pub const DROP_HOVER_EVENT: &str = "drop-hover";

/// Transient status line shown after an action like copy
#[derive(Debug, Clone, Serialize)]
pub struct StatusNotice {
    pub message: String,
    pub success: bool,
}

/// Forwards controller status changes to the frontend
pub struct TauriEmitter<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriEmitter<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> StatusEmitter for TauriEmitter<R> {
    fn emit_status(&self, snapshot: &StatusSnapshot) {
        if let Err(e) = self.app.emit(CONVERSION_STATUS_EVENT, snapshot) {
            tracing::warn!("Failed to emit status: {}", e);
        }
    }
}

/// System clipboard via the clipboard-manager plugin
pub struct TauriClipboard<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriClipboard<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ClipboardSink for TauriClipboard<R> {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.app
            .clipboard()
            .write_text(text)
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

pub fn emit_notice<R: Runtime>(app: &AppHandle<R>, notice: StatusNotice) {
    if let Err(e) = app.emit(STATUS_NOTICE_EVENT, notice) {
        tracing::warn!("Failed to emit notice: {}", e);
    }
}

/// Hover feedback and file submission for window drag-and-drop
pub fn handle_drag_drop<R: Runtime>(app: &AppHandle<R>, event: &DragDropEvent) {
    match event {
        DragDropEvent::Enter { .. } => set_hover(app, true),
        DragDropEvent::Leave => set_hover(app, false),
        DragDropEvent::Drop { paths, .. } => {
            set_hover(app, false);

            let Some(state) = app.try_state::<AppState>() else {
                tracing::warn!("Drop received before state was ready");
                return;
            };

            let references: Vec<String> = paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let controller = state.controller.clone();

            tauri::async_runtime::spawn(async move {
                controller.submit_drop(&references).await;
            });
        }
        _ => {}
    }
}

fn set_hover<R: Runtime>(app: &AppHandle<R>, hovering: bool) {
    if let Err(e) = app.emit(DROP_HOVER_EVENT, hovering) {
        tracing::warn!("Failed to emit drop hover: {}", e);
    }
}
