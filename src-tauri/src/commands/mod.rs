use docmark_core::{
    dialog_filters, AppState, CopyOutcome, DialogFilter, Settings, StatusSnapshot,
    SUPPORTED_EXTENSIONS,
};
use serde::Serialize;
use tauri::{AppHandle, Runtime, State};
use tauri_plugin_dialog::DialogExt;
use tokio::sync::oneshot;

use crate::error::{CommandError, CommandResult, ResultExt};
use crate::events::{emit_notice, StatusNotice};

const DIALOG_TITLE: &str = "Select Document or HTML File";

/// File types the app accepts, for the frontend drop zone and dialog
#[derive(Debug, Clone, Serialize)]
pub struct SupportedFormats {
    pub extensions: Vec<String>,
    pub filters: Vec<DialogFilter>,
}

// ============================================================================
// Status
// ============================================================================

#[tauri::command]
pub async fn get_status(state: State<'_, AppState>) -> CommandResult<StatusSnapshot> {
    Ok(state.controller.snapshot().await)
}

#[tauri::command]
pub fn get_supported_formats() -> SupportedFormats {
    SupportedFormats {
        extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        filters: dialog_filters(),
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Start converting a file. Progress and the result arrive as
/// `conversion-status` events.
#[tauri::command]
pub async fn submit_path(path: String, state: State<'_, AppState>) -> CommandResult<()> {
    if path.trim().is_empty() {
        return Err(CommandError::invalid_path());
    }

    let controller = state.controller.clone();
    tauri::async_runtime::spawn(async move {
        controller.submit_path(&path).await;
    });

    Ok(())
}

/// Show the file dialog and convert the chosen file.
/// Returns the chosen path, or `None` when the dialog was cancelled.
#[tauri::command]
pub async fn open_document<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState>,
) -> CommandResult<Option<String>> {
    let (tx, rx) = oneshot::channel();

    let mut dialog = app.dialog().file().set_title(DIALOG_TITLE);
    for filter in dialog_filters() {
        dialog = dialog.add_filter(filter.name, filter.extensions);
    }
    dialog = dialog.add_filter("All Files", &["*"]);

    dialog.pick_file(move |picked| {
        let _ = tx.send(picked);
    });

    let Some(picked) = rx.await.internal_err()? else {
        tracing::debug!("File dialog cancelled");
        return Ok(None);
    };

    let path = picked.into_path().dialog_err()?;
    let path = path.to_string_lossy().into_owned();

    let controller = state.controller.clone();
    let submitted = path.clone();
    tauri::async_runtime::spawn(async move {
        controller.submit_path(&submitted).await;
    });

    Ok(Some(path))
}

/// Copy the displayed Markdown and flash a notice in the status bar
#[tauri::command]
pub async fn copy_markdown<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState>,
) -> CommandResult<CopyOutcome> {
    let outcome = state.controller.copy_result().await;

    emit_notice(
        &app,
        StatusNotice {
            message: outcome.notice().to_string(),
            success: matches!(outcome, CopyOutcome::Copied { .. }),
        },
    );

    Ok(outcome)
}

// ============================================================================
// Settings
// ============================================================================

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> CommandResult<Settings> {
    Ok(state.settings.read().await.clone())
}

/// Persist settings. They apply from the next start.
#[tauri::command]
pub async fn save_settings(settings: Settings, state: State<'_, AppState>) -> CommandResult<()> {
    let engine = settings.engine;
    state.save_settings(settings).await.storage_err()?;
    tracing::info!(?engine, "Settings saved");
    Ok(())
}
