use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use docmark_core::{
    AppState, Config, ConverterEngine, MemoryClipboard, NoOpEmitter, Settings, StatusSnapshot,
};

/// Convert a single document from the command line.
/// Returns the process exit code.
pub fn run(path: PathBuf, engine: Option<ConverterEngine>, output: Option<PathBuf>) -> i32 {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return 1;
        }
    };

    match rt.block_on(convert(&path, engine, output.as_deref())) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(path = %path.display(), "Conversion failed: {:#}", e);
            eprintln!("{:#}", e);
            1
        }
    }
}

async fn convert(
    path: &Path,
    engine: Option<ConverterEngine>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let mut settings = Settings::load(&config.settings_file);
    if let Some(engine) = engine {
        settings.engine = engine;
    }

    let state = AppState::with_settings(
        config,
        settings,
        Arc::new(NoOpEmitter),
        Arc::new(MemoryClipboard::default()),
    );
    state.controller.prepare_environment();

    state.controller.submit_path(&path.to_string_lossy()).await;
    let markdown = markdown_or_error(state.controller.snapshot().await)?;

    match output {
        Some(output) => {
            std::fs::write(output, &markdown)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!(output = %output.display(), "Markdown written");
        }
        None => println!("{}", markdown),
    }

    Ok(())
}

fn markdown_or_error(snapshot: StatusSnapshot) -> anyhow::Result<String> {
    if let Some(markdown) = snapshot.markdown {
        return Ok(markdown);
    }
    match snapshot.error {
        Some(error) => anyhow::bail!("{}", error.message),
        None => anyhow::bail!("{}", snapshot.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_convert_html_to_output_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("page.html");
        let output = temp_dir.path().join("page.md");
        std::fs::write(&input, "<h2>Agenda</h2><ul><li>Budget</li></ul>").unwrap();

        convert(&input, Some(ConverterEngine::Native), Some(&output))
            .await
            .unwrap();

        let markdown = std::fs::read_to_string(&output).unwrap();
        assert!(markdown.contains("Agenda"));
        assert!(markdown.contains("Budget"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();

        let err = convert(
            &temp_dir.path().join("gone.pdf"),
            Some(ConverterEngine::Native),
            None,
        )
        .await
        .unwrap_err();

        assert!(!err.to_string().is_empty());
    }
}
