//! Command error types for Tauri frontend communication
//!
//! Provides structured, type-safe errors that serialize to `{"code": "...", "message": "..."}`.

use serde::Serialize;

/// Errors returned by Tauri commands
///
/// Each variant serializes with a snake_case `code` field for frontend matching.
/// Conversion failures are not command errors; they arrive as part of the
/// status snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CommandError {
    // Validation errors
    InvalidPath { message: String },

    // Operation errors
    DialogError { message: String },
    StorageError { message: String },
    InternalError { message: String },
}

impl CommandError {
    pub fn invalid_path() -> Self {
        Self::InvalidPath {
            message: "No file path given".to_string(),
        }
    }

    pub fn dialog(message: impl Into<String>) -> Self {
        Self::DialogError {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath { message } => write!(f, "{}", message),
            Self::DialogError { message } => write!(f, "{}", message),
            Self::StorageError { message } => write!(f, "{}", message),
            Self::InternalError { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CommandError {}

/// Result type alias for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Extension trait for converting Results to CommandResult
pub trait ResultExt<T> {
    fn storage_err(self) -> CommandResult<T>;
    fn dialog_err(self) -> CommandResult<T>;
    fn internal_err(self) -> CommandResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn storage_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::storage(e.to_string()))
    }

    fn dialog_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::dialog(e.to_string()))
    }

    fn internal_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_code_and_message() {
        let json = serde_json::to_value(CommandError::invalid_path()).unwrap();

        assert_eq!(json["code"], "invalid_path");
        assert_eq!(json["message"], "No file path given");
    }

    #[test]
    fn test_result_ext_maps_to_variant() {
        let result: Result<(), String> = Err("disk full".to_string());

        match result.storage_err() {
            Err(CommandError::StorageError { message }) => assert_eq!(message, "disk full"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
