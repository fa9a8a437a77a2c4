mod logic;

use std::path::Path;

use crate::config::AppConfig;
use crate::databases::{DatabaseType, factory};
use crate::errors::Result;

/// Public entry point for the restore process: builds the handler for the
/// requested type and drives the restore orchestration.
pub async fn run_restore_flow(
    config: &AppConfig,
    db_type: DatabaseType,
    db_name: Option<&str>,
    backup_file: &Path,
    skip_confirmation: bool,
) -> Result<()> {
    let handler = factory::get_handler(db_type, config)?;
    logic::perform_restore(handler.as_ref(), db_name, backup_file, skip_confirmation).await
}
