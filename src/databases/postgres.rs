//! PostgreSQL handler: `pg_dump` for backups, `psql` for restores. The
//! password travels via `PGPASSWORD` in the child environment, never on the
//! command line.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::command::{self, PROBE_TIMEOUT, invoke, resolve_tool};
use crate::config::PostgresConfig;
use crate::errors::{AppError, Result};

use super::{DatabaseHandler, DatabaseType};

const INSTALL_HINT: &str = "Please install PostgreSQL client tools and ensure they are in PATH.";

pub struct PostgresHandler {
    config: PostgresConfig,
}

impl PostgresHandler {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    fn connection_args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.config.host.clone(),
            "-p".to_string(),
            self.config.port.to_string(),
            "-U".to_string(),
            self.config.username.clone(),
        ]
    }

    /// Best-effort existence check against the maintenance database. A broken
    /// probe must not block the restore, so failures degrade to "assume it
    /// exists".
    async fn database_exists(&self, database: &str) -> bool {
        let psql = match resolve_tool("psql", INSTALL_HINT) {
            Ok(path) => path,
            Err(_) => return true,
        };
        let result = invoke(&psql)
            .arg("-X")
            .args(self.connection_args())
            .args(["-d", "postgres", "-tA", "-c"])
            .arg(format!(
                "SELECT 1 FROM pg_database WHERE datname = '{}'",
                database.replace('\'', "''")
            ))
            .env("PGPASSWORD", self.config.password.expose())
            .timeout(PROBE_TIMEOUT)
            .run()
            .await;
        match result {
            Ok(out) => out.stdout.trim() == "1",
            Err(_) => {
                warn!(database, "could not check whether database exists, assuming it does");
                true
            }
        }
    }
}

#[async_trait]
impl DatabaseHandler for PostgresHandler {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn validate_tools(&self) -> Result<()> {
        resolve_tool("pg_dump", INSTALL_HINT)?;
        resolve_tool("psql", INSTALL_HINT)?;
        debug!("postgres tools validated");
        self.validate_connection().await
    }

    async fn validate_connection(&self) -> Result<()> {
        debug!(host = %self.config.host, port = self.config.port, "probing postgres connectivity");
        let psql = resolve_tool("psql", INSTALL_HINT)?;
        let probe_db = if self.config.database.is_empty() {
            "postgres"
        } else {
            self.config.database.as_str()
        };
        invoke(&psql)
            .arg("-X")
            .args(self.connection_args())
            .args(["-d", probe_db, "-c", "SELECT 1;"])
            .env("PGPASSWORD", self.config.password.expose())
            .timeout(PROBE_TIMEOUT)
            .run()
            .await
            .map_err(command::ToolError::into_connection)?;
        debug!("postgres connection probe succeeded");
        Ok(())
    }

    async fn backup(&self, database: &str, output_file: &Path) -> Result<()> {
        info!(database, "starting postgres backup");
        let pg_dump = resolve_tool("pg_dump", INSTALL_HINT)?;
        invoke(&pg_dump)
            .args(self.connection_args())
            .arg("--file")
            .arg(output_file)
            .arg(database)
            .env("PGPASSWORD", self.config.password.expose())
            .run()
            .await
            .map_err(command::ToolError::into_backup)?;
        debug!("pg_dump completed");
        Ok(())
    }

    async fn restore(&self, database: &str, input_file: &Path) -> Result<()> {
        info!(database, "starting postgres restore");
        if !input_file.is_file() {
            return Err(AppError::NotFound(input_file.to_path_buf()));
        }

        if !self.database_exists(database).await {
            return Err(AppError::Restore(format!(
                "database '{database}' does not exist on {}. Create it first with: \
                 CREATE DATABASE \"{database}\";",
                self.config.host
            )));
        }

        let psql = resolve_tool("psql", INSTALL_HINT)?;
        invoke(&psql)
            .args(["-X", "-q", "-v", "ON_ERROR_STOP=1"])
            .args(self.connection_args())
            .args(["-d", database])
            .arg("-f")
            .arg(input_file)
            .env("PGPASSWORD", self.config.password.expose())
            .run()
            .await
            .map_err(command::ToolError::into_restore)?;
        debug!("psql restore completed");
        Ok(())
    }
}
