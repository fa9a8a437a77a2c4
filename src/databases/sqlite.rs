//! SQLite handler: backup and restore are byte-exact file copies of the
//! configured database file. No external tools are involved.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::errors::{AppError, Result};

use super::{DatabaseHandler, DatabaseType};

pub struct SqliteHandler {
    config: SqliteConfig,
}

impl SqliteHandler {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DatabaseHandler for SqliteHandler {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    // No external tool dependency; only the file itself needs checking.
    async fn validate_tools(&self) -> Result<()> {
        self.validate_connection().await
    }

    /// Filesystem accessibility stands in for a network probe: the parent
    /// directory must exist, and the file must be readable if present.
    async fn validate_connection(&self) -> Result<()> {
        let db_path = &self.config.db_path;
        match db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                return Err(AppError::Connection(format!(
                    "directory {} does not exist",
                    parent.display()
                )));
            }
            _ => {}
        }
        if db_path.exists() {
            fs::File::open(db_path).map_err(|e| {
                AppError::Connection(format!(
                    "database file {} is not readable: {e}",
                    db_path.display()
                ))
            })?;
        }
        debug!(path = %db_path.display(), "sqlite database path validated");
        Ok(())
    }

    async fn backup(&self, database: &str, output_file: &Path) -> Result<()> {
        info!(database, path = %self.config.db_path.display(), "starting sqlite backup");
        if !self.config.db_path.is_file() {
            return Err(AppError::NotFound(self.config.db_path.clone()));
        }
        fs::copy(&self.config.db_path, output_file).map_err(|e| {
            AppError::Backup(format!(
                "failed to copy {} to {}: {e}",
                self.config.db_path.display(),
                output_file.display()
            ))
        })?;
        debug!(output = %output_file.display(), "sqlite file copied");
        Ok(())
    }

    /// Overwrites the configured file in place; no pre-restore snapshot is
    /// taken.
    async fn restore(&self, database: &str, input_file: &Path) -> Result<()> {
        info!(database, path = %self.config.db_path.display(), "starting sqlite restore");
        if !input_file.is_file() {
            return Err(AppError::NotFound(input_file.to_path_buf()));
        }
        fs::copy(input_file, &self.config.db_path).map_err(|e| {
            AppError::Restore(format!(
                "failed to copy {} to {}: {e}",
                input_file.display(),
                self.config.db_path.display()
            ))
        })?;
        debug!(input = %input_file.display(), "sqlite file restored");
        Ok(())
    }
}
