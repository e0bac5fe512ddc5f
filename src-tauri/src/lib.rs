pub mod commands;
pub mod error;
pub mod events;
pub mod headless;

use std::sync::Arc;

use docmark_core::{AppState, Config};
use tauri::{Manager, WindowEvent};

use crate::events::{TauriClipboard, TauriEmitter};

/// Initialize tracing/logging with the given directives
pub fn init_logging(directives: &[&str]) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in directives {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {:?}: {}", directive, e),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging(&["docmark=debug", "docmark_lib=debug", "docmark_core=debug"]);
    tracing::info!("Starting DocuMark");

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_clipboard_manager::init())
        .setup(|app| {
            let config = Config::load_or_default();
            config.ensure_dirs()?;
            tracing::info!("Data directory: {:?}", config.data_dir);

            let handle = app.handle().clone();
            let state = AppState::new(
                config,
                Arc::new(TauriEmitter::new(handle.clone())),
                Arc::new(TauriClipboard::new(handle)),
            );

            // Before any conversion task can read the environment
            state.controller.prepare_environment();

            app.manage(state);
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::DragDrop(drop) = event {
                events::handle_drag_drop(window.app_handle(), drop);
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_status,
            commands::get_supported_formats,
            commands::submit_path,
            commands::open_document,
            commands::copy_markdown,
            commands::get_settings,
            commands::save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
