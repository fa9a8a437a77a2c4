//! MySQL handler: `mysqldump` for backups, the `mysql` client for restores.
//! The password is supplied through `MYSQL_PWD` in the child environment so
//! it never shows up in a process listing.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::command::{self, PROBE_TIMEOUT, invoke, resolve_tool};
use crate::config::MysqlConfig;
use crate::errors::{AppError, Result};

use super::{DatabaseHandler, DatabaseType};

const INSTALL_HINT: &str =
    "Please install MySQL client tools. Download from: https://dev.mysql.com/downloads/";

pub struct MysqlHandler {
    config: MysqlConfig,
}

impl MysqlHandler {
    pub fn new(config: MysqlConfig) -> Self {
        Self { config }
    }

    fn connection_args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.config.host.clone(),
            "-P".to_string(),
            self.config.port.to_string(),
            "-u".to_string(),
            self.config.username.clone(),
        ]
    }

    /// Best-effort existence check; a broken probe degrades to "assume it
    /// exists" rather than blocking the restore on a false negative.
    async fn database_exists(&self, database: &str) -> bool {
        let mysql = match resolve_tool("mysql", INSTALL_HINT) {
            Ok(path) => path,
            Err(_) => return true,
        };
        let result = invoke(&mysql)
            .args(self.connection_args())
            .arg("-e")
            .arg(format!("SHOW DATABASES LIKE '{}';", database.replace('\'', "''")))
            .env("MYSQL_PWD", self.config.password.expose())
            .timeout(PROBE_TIMEOUT)
            .run()
            .await;
        match result {
            // Header line plus a row means the database showed up.
            Ok(out) => out.stdout.trim().lines().count() > 1,
            Err(_) => {
                warn!(database, "could not check whether database exists, assuming it does");
                true
            }
        }
    }
}

#[async_trait]
impl DatabaseHandler for MysqlHandler {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Mysql
    }

    async fn validate_tools(&self) -> Result<()> {
        resolve_tool("mysqldump", INSTALL_HINT)?;
        resolve_tool("mysql", INSTALL_HINT)?;
        debug!("mysql tools validated");
        self.validate_connection().await
    }

    async fn validate_connection(&self) -> Result<()> {
        debug!(host = %self.config.host, port = self.config.port, "probing mysql connectivity");
        let mysql = resolve_tool("mysql", INSTALL_HINT)?;
        invoke(&mysql)
            .args(self.connection_args())
            .args(["-e", "SELECT 1;"])
            .env("MYSQL_PWD", self.config.password.expose())
            .timeout(PROBE_TIMEOUT)
            .run()
            .await
            .map_err(command::ToolError::into_connection)?;
        debug!("mysql connection probe succeeded");
        Ok(())
    }

    async fn backup(&self, database: &str, output_file: &Path) -> Result<()> {
        info!(database, "starting mysql backup");
        let mysqldump = resolve_tool("mysqldump", INSTALL_HINT)?;
        invoke(&mysqldump)
            .args(self.connection_args())
            .arg("--result-file")
            .arg(output_file)
            .arg(database)
            .env("MYSQL_PWD", self.config.password.expose())
            .run()
            .await
            .map_err(command::ToolError::into_backup)?;
        debug!("mysqldump completed");
        Ok(())
    }

    async fn restore(&self, database: &str, input_file: &Path) -> Result<()> {
        info!(database, "starting mysql restore");
        if !input_file.is_file() {
            return Err(AppError::NotFound(input_file.to_path_buf()));
        }

        if !self.database_exists(database).await {
            return Err(AppError::Restore(format!(
                "database '{database}' does not exist. Create it first with: \
                 CREATE DATABASE {database};"
            )));
        }

        let mysql = resolve_tool("mysql", INSTALL_HINT)?;
        let result = invoke(&mysql)
            .args(self.connection_args())
            .arg(database)
            .stdin_file(input_file)
            .env("MYSQL_PWD", self.config.password.expose())
            .run()
            .await;

        match result {
            Ok(_) => {
                debug!("mysql restore completed");
                Ok(())
            }
            // The pre-check is best effort, so the client can still hit a
            // missing database here; annotate it with the remediation hint.
            Err(command::ToolError::Exit { stderr, .. })
                if stderr.contains("Unknown database") =>
            {
                Err(AppError::Restore(format!(
                    "{}\nHint: create the database first with: CREATE DATABASE {database};",
                    stderr.trim()
                )))
            }
            Err(e) => Err(e.into_restore()),
        }
    }
}
