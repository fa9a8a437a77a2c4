use std::io::{Write, stdin, stdout};
use std::path::Path;

use tracing::info;

use crate::backup::archive;
use crate::databases::DatabaseHandler;
use crate::errors::{AppError, Result};
use crate::naming;

/// Drives one restore: validate tools, resolve the target database name
/// (explicit, else decoded from the filename), confirm the destructive
/// operation unless suppressed, then run the handler's restore. Compressed
/// artifacts are extracted to a temporary directory first.
pub async fn perform_restore(
    handler: &dyn DatabaseHandler,
    db_name: Option<&str>,
    backup_file: &Path,
    skip_confirmation: bool,
) -> Result<()> {
    run_restore(handler, db_name, backup_file, skip_confirmation, prompt_confirmation).await
}

// Confirmation is injected so the gate can be exercised without a tty.
async fn run_restore(
    handler: &dyn DatabaseHandler,
    db_name: Option<&str>,
    backup_file: &Path,
    skip_confirmation: bool,
    confirm: impl Fn(&str, &Path) -> Result<bool>,
) -> Result<()> {
    handler.validate_tools().await?;

    if !backup_file.is_file() {
        return Err(AppError::NotFound(backup_file.to_path_buf()));
    }
    let file_name = backup_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let db_name = match db_name {
        Some(name) => name.to_string(),
        None => match naming::decode_db_name(&file_name) {
            Some(name) => {
                println!("ℹ️  Detected database name from filename: {name}");
                name
            }
            None => {
                return Err(AppError::InvalidInput(format!(
                    "could not detect database name from '{file_name}'. Pass --db-name \
                     explicitly. Expected format: \
                     <db_type>_<db_name>_full_<YYYY-MM-DD>_<HH-MM-SS>.<ext>"
                )));
            }
        },
    };

    if !skip_confirmation && !confirm(&db_name, backup_file)? {
        return Err(AppError::Cancelled(format!(
            "restore of '{db_name}' declined at confirmation prompt"
        )));
    }

    info!(db_type = %handler.db_type(), db_name, artifact = %backup_file.display(), "starting restore");
    if file_name.ends_with(".tar.gz") || file_name.ends_with(".tar") {
        let temp_dir = tempfile::tempdir()?;
        let inner = archive::extract_artifact(backup_file, temp_dir.path())?;
        handler.restore(&db_name, &inner).await?;
    } else {
        handler.restore(&db_name, backup_file).await?;
    }

    info!(db_name, "restore completed");
    Ok(())
}

/// Interactive confirmation describing the destructive, irreversible nature
/// of the operation. Defaults to No.
fn prompt_confirmation(db_name: &str, backup_file: &Path) -> Result<bool> {
    println!(
        "⚠️  You are about to restore '{}' from {}.",
        db_name,
        backup_file.display()
    );
    println!("This will OVERWRITE the current contents of '{db_name}' and cannot be undone.");
    print!("Continue? [y/N]: ");
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::databases::DatabaseType;

    #[derive(Default)]
    struct RecordingHandler {
        restore_called: AtomicBool,
    }

    #[async_trait]
    impl DatabaseHandler for RecordingHandler {
        fn db_type(&self) -> DatabaseType {
            DatabaseType::Postgres
        }

        async fn validate_tools(&self) -> Result<()> {
            Ok(())
        }

        async fn validate_connection(&self) -> Result<()> {
            Ok(())
        }

        async fn backup(&self, _database: &str, _output_file: &Path) -> Result<()> {
            Ok(())
        }

        async fn restore(&self, _database: &str, _input_file: &Path) -> Result<()> {
            self.restore_called.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn backup_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"-- dump\n").unwrap();
        path
    }

    #[tokio::test]
    async fn declined_confirmation_aborts_before_restore() {
        let dir = tempfile::tempdir().unwrap();
        let file = backup_file(dir.path(), "postgres_app_full_2026-01-07_23-45-12.sql");
        let handler = RecordingHandler::default();

        let err = run_restore(&handler, Some("app"), &file, false, |_, _| Ok(false))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled(_)));
        assert!(!handler.restore_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn skip_confirmation_runs_restore_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let file = backup_file(dir.path(), "postgres_app_full_2026-01-07_23-45-12.sql");
        let handler = RecordingHandler::default();

        run_restore(&handler, Some("app"), &file, true, |_, _| {
            panic!("confirmation must not be consulted with --yes")
        })
        .await
        .unwrap();

        assert!(handler.restore_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn db_name_is_decoded_from_filename_when_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let file = backup_file(dir.path(), "postgres_my_production_db_full_2026-01-07_23-45-12.sql");
        let handler = RecordingHandler::default();

        run_restore(&handler, None, &file, true, |_, _| Ok(true))
            .await
            .unwrap();
        assert!(handler.restore_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn undecodable_filename_without_explicit_name_is_guided() {
        let dir = tempfile::tempdir().unwrap();
        let file = backup_file(dir.path(), "random_file.sql");
        let handler = RecordingHandler::default();

        let err = run_restore(&handler, None, &file, true, |_, _| Ok(true))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidInput(message) => {
                assert!(message.contains("--db-name"));
                assert!(message.contains("_full_"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert!(!handler.restore_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn missing_backup_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::default();

        let err = run_restore(
            &handler,
            Some("app"),
            &dir.path().join("absent.sql"),
            true,
            |_, _| Ok(true),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
