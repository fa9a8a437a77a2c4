//! Database backends: the handler contract and one implementation per
//! supported database type.

pub mod factory;
pub mod mongodb;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Local;

use crate::errors::{AppError, Result};
use crate::naming;

/// Closed set of supported database type tags. Keeping this an enum (rather
/// than a string) makes the factory dispatch exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DatabaseType {
    Postgres,
    Mysql,
    Sqlite,
    Mongodb,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::Postgres,
        DatabaseType::Mysql,
        DatabaseType::Sqlite,
        DatabaseType::Mongodb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Mongodb => "mongodb",
        }
    }

    /// Extension of an uncompressed artifact for this backend.
    pub fn artifact_extension(&self) -> &'static str {
        match self {
            DatabaseType::Postgres | DatabaseType::Mysql => "sql",
            DatabaseType::Sqlite => "db",
            DatabaseType::Mongodb => "archive",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        DatabaseType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::UnsupportedType {
                requested: s.to_string(),
                supported: DatabaseType::ALL
                    .into_iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            })
    }
}

/// Capability contract every backend must satisfy. A handler is bound to one
/// resolved configuration at construction, used for exactly one backup or
/// restore operation, and discarded; it holds no pools or cross-call caches.
#[async_trait]
pub trait DatabaseHandler: Send + Sync {
    fn db_type(&self) -> DatabaseType;

    /// Confirms the required external executables are resolvable, then probes
    /// connectivity. Must fail with `ToolNotFound` before any backup/restore
    /// attempt when an executable is missing.
    async fn validate_tools(&self) -> Result<()>;

    /// Lightweight probe against the target with a bounded timeout. Error
    /// messages must never contain credentials.
    async fn validate_connection(&self) -> Result<()>;

    /// Artifact filename for a backup taken now. No I/O beyond reading the
    /// wall clock.
    fn default_backup_name(&self, database: &str) -> String {
        naming::encode(self.db_type(), database, Local::now().naive_local())
    }

    /// Backend-specific dump/copy writing to `output_file`.
    async fn backup(&self, database: &str, output_file: &Path) -> Result<()>;

    /// Backend-specific restore/copy reading from `input_file`.
    async fn restore(&self, database: &str, input_file: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_round_trip_through_from_str() {
        for db_type in DatabaseType::ALL {
            assert_eq!(db_type.as_str().parse::<DatabaseType>().unwrap(), db_type);
        }
    }

    #[test]
    fn unknown_tag_lists_supported_types() {
        let err = "oracle".parse::<DatabaseType>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("oracle"));
        for db_type in DatabaseType::ALL {
            assert!(message.contains(db_type.as_str()), "missing {db_type} in {message}");
        }
    }
}
