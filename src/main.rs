//! dbvault — CLI tool for database backups and restores.
//!
//! Orchestrates vendor dump/restore utilities (pg_dump/psql, mysqldump/mysql,
//! mongodump/mongorestore) or direct file copies (SQLite), with
//! self-describing artifact names and a confirmation-gated restore.

mod backup;
mod command;
mod config;
mod databases;
mod errors;
mod logging;
mod naming;
mod restore;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use config::AppConfig;
use databases::DatabaseType;
use errors::Result;

const LOG_FILE_NAME: &str = "dbvault.log";

#[derive(Debug, Parser)]
#[command(
    name = "dbvault",
    version,
    about = "CLI tool for database backups and restores",
    disable_version_flag = true
)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a backup of a database
    Backup {
        /// Database type
        #[arg(long, value_enum)]
        db: DatabaseType,

        /// Name of the database to back up
        #[arg(long = "db-name")]
        db_name: String,

        /// Compress the backup file using tar.gz
        #[arg(long)]
        compress: bool,

        /// Path to config.json (default: ./config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Restore a database from a backup file
    Restore {
        /// Database type
        #[arg(long, value_enum)]
        db: DatabaseType,

        /// Path to the backup file to restore from
        #[arg(long)]
        file: PathBuf,

        /// Target database name (default: decoded from the backup filename)
        #[arg(long = "db-name")]
        db_name: Option<String>,

        /// Path to config.json (default: ./config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the confirmation prompt (use with caution)
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_app(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_app(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Backup {
            db,
            db_name,
            compress,
            config,
        } => {
            let app_config = AppConfig::load(config.as_deref())?;
            let log_file = app_config.backup_directory().join(LOG_FILE_NAME);
            logging::init(&log_file)?;

            println!("🚀 Starting backup of '{db_name}' ({db})...");
            let artifact = backup::run_backup_flow(&app_config, db, &db_name, compress).await?;

            println!("✅ Backup completed successfully.");
            println!("Backup file: {}", artifact.display());
            println!("Logs: {}", log_file.display());
        }
        Commands::Restore {
            db,
            file,
            db_name,
            config,
            yes,
        } => {
            let app_config = AppConfig::load(config.as_deref())?;
            let log_file = app_config.backup_directory().join(LOG_FILE_NAME);
            logging::init(&log_file)?;

            restore::run_restore_flow(&app_config, db, db_name.as_deref(), &file, yes).await?;

            println!("✅ Restore completed successfully.");
            println!("Logs: {}", log_file.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backup_args_parse() {
        let cli = Cli::try_parse_from([
            "dbvault", "backup", "--db", "postgres", "--db-name", "app", "--compress",
        ])
        .unwrap();
        match cli.command {
            Commands::Backup { db, db_name, compress, config } => {
                assert_eq!(db, DatabaseType::Postgres);
                assert_eq!(db_name, "app");
                assert!(compress);
                assert!(config.is_none());
            }
            _ => panic!("expected backup subcommand"),
        }
    }

    #[test]
    fn restore_short_yes_flag_parses() {
        let cli = Cli::try_parse_from([
            "dbvault", "restore", "--db", "sqlite", "--file", "b.db", "-y",
        ])
        .unwrap();
        match cli.command {
            Commands::Restore { yes, db_name, .. } => {
                assert!(yes);
                assert!(db_name.is_none());
            }
            _ => panic!("expected restore subcommand"),
        }
    }

    #[test]
    fn version_flag_prints_version_in_both_spellings() {
        for flag in ["--version", "-v"] {
            let err = Cli::try_parse_from(["dbvault", flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
            assert!(err.to_string().contains(env!("CARGO_PKG_VERSION")));
        }
    }

    #[test]
    fn unknown_db_tag_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from([
            "dbvault", "backup", "--db", "oracle", "--db-name", "app",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }
}
