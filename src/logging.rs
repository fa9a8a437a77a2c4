//! Leveled file logging for backup/restore runs. Records go to a log file in
//! the backup directory so every artifact ships with its operation log;
//! user-facing status stays on stdout/stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::errors::{AppError, Result};

/// Initializes the global tracing subscriber writing to `log_file`,
/// creating the parent directory if needed. Filter defaults to `info`,
/// overridable via `RUST_LOG`.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to initialize logging: {e}")))?;
    Ok(())
}
