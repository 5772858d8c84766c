//! Error types for prepline operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreplineError>;

#[derive(Error, Debug)]
pub enum PreplineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset not found: {id}")]
    DatasetNotFound { id: String },

    #[error("Version not found: {version}")]
    VersionNotFound { version: String },

    #[error("No execution history to operate on")]
    EmptyHistory,

    #[error("Snapshot v{sequence} already exists")]
    Conflict { sequence: u64 },

    #[error("Corrupt snapshot store: unparsable snapshot filename: {path}")]
    CorruptStore { path: PathBuf },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Unsupported preprocessing action: {action}")]
    UnsupportedAction { action: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl PreplineError {
    pub fn dataset_not_found(id: impl Into<String>) -> Self {
        Self::DatasetNotFound { id: id.into() }
    }

    pub fn version_not_found(version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            version: version.into(),
        }
    }

    pub fn corrupt_store(path: impl Into<PathBuf>) -> Self {
        Self::CorruptStore { path: path.into() }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    pub fn unsupported_action(action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            action: action.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }
}
