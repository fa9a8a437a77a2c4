mod logic;
pub(crate) mod archive;

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::databases::{DatabaseType, factory};
use crate::errors::Result;

/// Public entry point for the backup process: builds the handler for the
/// requested type and drives the backup orchestration.
pub async fn run_backup_flow(
    config: &AppConfig,
    db_type: DatabaseType,
    db_name: &str,
    compress: bool,
) -> Result<PathBuf> {
    let handler = factory::get_handler(db_type, config)?;
    logic::perform_backup(handler.as_ref(), db_name, &config.backup_directory(), compress).await
}
