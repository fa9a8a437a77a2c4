//! MongoDB handler: `mongodump`/`mongorestore` in archive mode, optionally
//! gzip-compressed. Restore replays the archive into its original
//! namespaces; restoring into a renamed database (`--nsFrom`/`--nsTo`) is
//! not supported.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::{self, PROBE_TIMEOUT, invoke, resolve_tool};
use crate::config::MongodbConfig;
use crate::errors::{AppError, Result};

use super::{DatabaseHandler, DatabaseType};

const INSTALL_HINT: &str = "Please install MongoDB Database Tools. \
     Download from: https://www.mongodb.com/try/download/database-tools";

pub struct MongodbHandler {
    config: MongodbConfig,
}

impl MongodbHandler {
    pub fn new(config: MongodbConfig) -> Self {
        Self { config }
    }

    /// Connection arguments shared by the dump/restore/probe tools. The
    /// vendor tools have no password environment variable, so authentication
    /// goes on the argument vector; the invocation itself is never logged.
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "--host".to_string(),
            self.config.host.clone(),
            "--port".to_string(),
            self.config.port.to_string(),
        ];
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            args.push("--username".to_string());
            args.push(username.clone());
            args.push("--password".to_string());
            args.push(password.expose().to_string());
            args.push("--authenticationDatabase".to_string());
            args.push(self.config.auth_database.clone());
        }
        args
    }
}

#[async_trait]
impl DatabaseHandler for MongodbHandler {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Mongodb
    }

    async fn validate_tools(&self) -> Result<()> {
        resolve_tool("mongodump", INSTALL_HINT)?;
        resolve_tool("mongorestore", INSTALL_HINT)?;
        debug!("mongodb tools validated");
        self.validate_connection().await
    }

    /// Probes via `mongosh` when present; otherwise validation is deferred to
    /// the backup/restore attempt itself.
    async fn validate_connection(&self) -> Result<()> {
        let Ok(mongosh) = resolve_tool("mongosh", INSTALL_HINT) else {
            debug!("mongosh not found, skipping explicit connection probe");
            return Ok(());
        };
        debug!(host = %self.config.host, port = self.config.port, "probing mongodb connectivity");
        invoke(&mongosh)
            .args(self.base_args())
            .args(["--eval", "db.runCommand({ ping: 1 })"])
            .timeout(PROBE_TIMEOUT)
            .run()
            .await
            .map_err(command::ToolError::into_connection)?;
        debug!("mongodb connection probe succeeded");
        Ok(())
    }

    async fn backup(&self, database: &str, output_file: &Path) -> Result<()> {
        info!(database, "starting mongodb backup");
        let mongodump = resolve_tool("mongodump", INSTALL_HINT)?;
        let mut invocation = invoke(&mongodump)
            .args(self.base_args())
            .arg(format!("--archive={}", output_file.display()));
        if self.config.gzip {
            invocation = invocation.arg("--gzip");
        }
        if !database.is_empty() {
            invocation = invocation.args(["--db", database]);
        }
        invocation
            .run()
            .await
            .map_err(command::ToolError::into_backup)?;
        debug!("mongodump completed");
        Ok(())
    }

    async fn restore(&self, database: &str, input_file: &Path) -> Result<()> {
        info!(database, "starting mongodb restore");
        if !input_file.is_file() {
            return Err(AppError::NotFound(input_file.to_path_buf()));
        }
        let mongorestore = resolve_tool("mongorestore", INSTALL_HINT)?;
        let mut invocation = invoke(&mongorestore)
            .args(self.base_args())
            .arg(format!("--archive={}", input_file.display()));
        if self.config.gzip {
            invocation = invocation.arg("--gzip");
        }
        invocation
            .run()
            .await
            .map_err(command::ToolError::into_restore)?;
        debug!("mongorestore completed");
        Ok(())
    }
}
