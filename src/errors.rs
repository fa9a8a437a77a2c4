use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported database type: {requested}. Supported types: {supported:?}")]
    UnsupportedType {
        requested: String,
        supported: Vec<String>,
    },

    #[error("{tool} not found in PATH. {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Restore failed: {0}")]
    Restore(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
