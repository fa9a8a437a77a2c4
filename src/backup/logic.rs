use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::backup::archive;
use crate::databases::DatabaseHandler;
use crate::errors::Result;

/// Drives one backup: validate tools and connectivity, compute the artifact
/// path inside `backup_dir`, run the handler's backup, optionally compress.
/// Any step failure aborts the sequence; a compression failure removes the
/// partial archive and leaves the uncompressed artifact untouched.
pub async fn perform_backup(
    handler: &dyn DatabaseHandler,
    db_name: &str,
    backup_dir: &Path,
    compress: bool,
) -> Result<PathBuf> {
    info!(db_type = %handler.db_type(), db_name, "starting backup");

    handler.validate_tools().await?;
    fs::create_dir_all(backup_dir)?;

    let filename = handler.default_backup_name(db_name);
    let output_file = backup_dir.join(&filename);

    handler.backup(db_name, &output_file).await?;
    info!(artifact = %output_file.display(), "backup written");

    if !compress {
        return Ok(output_file);
    }

    let archived = archive::compress_artifact(&output_file)?;
    fs::remove_file(&output_file)?;
    info!(artifact = %archived.display(), "backup compressed");
    Ok(archived)
}
