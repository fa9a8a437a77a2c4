//! Configuration layer: `config.json` sections per backend, secrets from the
//! environment. Resolution happens per backend on demand so a backup of one
//! database type never requires the other sections to be present.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{AppError, Result};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_BACKUP_DIR: &str = "./backups";

/// A resolved secret. Redacted from all `Debug` output so configs and
/// handlers can be logged without leaking credentials.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
struct RawPostgresConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMysqlConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSqliteConfig {
    db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMongodbConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    auth_database: Option<String>,
    gzip: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawBackupConfig {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    postgres: Option<RawPostgresConfig>,
    mysql: Option<RawMysqlConfig>,
    sqlite: Option<RawSqliteConfig>,
    mongodb: Option<RawMongodbConfig>,
    backup: Option<RawBackupConfig>,
}

// Resolved per-backend configs, passed by value into handler construction.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub db_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MongodbConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub auth_database: String,
    pub gzip: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    raw: RawConfig,
}

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

impl AppConfig {
    /// Loads configuration from `path`, defaulting to `config.json` in the
    /// current directory. `.env` is loaded first so secret variables can be
    /// kept out of the shell profile.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !path.is_file() {
            return Err(AppError::NotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        Self::from_json(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    fn from_json(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)?;
        Ok(Self { raw })
    }

    /// Directory where backup artifacts and the log file land.
    pub fn backup_directory(&self) -> PathBuf {
        self.raw
            .backup
            .as_ref()
            .and_then(|b| b.directory.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR))
    }

    pub fn postgres(&self) -> Result<PostgresConfig> {
        resolve_postgres(self.raw.postgres.as_ref(), &process_env)
    }

    pub fn mysql(&self) -> Result<MysqlConfig> {
        resolve_mysql(self.raw.mysql.as_ref(), &process_env)
    }

    pub fn sqlite(&self) -> Result<SqliteConfig> {
        resolve_sqlite(self.raw.sqlite.as_ref())
    }

    pub fn mongodb(&self) -> Result<MongodbConfig> {
        resolve_mongodb(self.raw.mongodb.as_ref(), &process_env)
    }
}

fn require_secret(env: EnvLookup<'_>, var: &str) -> Result<Secret> {
    env(var)
        .map(Secret::new)
        .ok_or_else(|| AppError::Config(format!("{var} environment variable not set")))
}

fn resolve_postgres(raw: Option<&RawPostgresConfig>, env: EnvLookup<'_>) -> Result<PostgresConfig> {
    let raw = raw.ok_or_else(|| {
        AppError::Config("missing 'postgres' section in config file".to_string())
    })?;
    Ok(PostgresConfig {
        host: raw.host.clone().unwrap_or_else(|| "localhost".to_string()),
        port: raw.port.unwrap_or(5432),
        username: raw.username.clone().unwrap_or_else(|| "postgres".to_string()),
        password: require_secret(env, "POSTGRES_PASSWORD")?,
        database: raw.database.clone().unwrap_or_default(),
    })
}

fn resolve_mysql(raw: Option<&RawMysqlConfig>, env: EnvLookup<'_>) -> Result<MysqlConfig> {
    let raw = raw
        .ok_or_else(|| AppError::Config("missing 'mysql' section in config file".to_string()))?;
    Ok(MysqlConfig {
        host: raw.host.clone().unwrap_or_else(|| "localhost".to_string()),
        port: raw.port.unwrap_or(3306),
        username: raw.username.clone().unwrap_or_else(|| "root".to_string()),
        password: require_secret(env, "MYSQL_PASSWORD")?,
        database: raw.database.clone().unwrap_or_default(),
    })
}

fn resolve_sqlite(raw: Option<&RawSqliteConfig>) -> Result<SqliteConfig> {
    let raw = raw
        .ok_or_else(|| AppError::Config("missing 'sqlite' section in config file".to_string()))?;
    let db_path = raw
        .db_path
        .clone()
        .ok_or_else(|| AppError::Config("sqlite.db_path must be set in config file".to_string()))?;
    Ok(SqliteConfig { db_path })
}

fn resolve_mongodb(raw: Option<&RawMongodbConfig>, env: EnvLookup<'_>) -> Result<MongodbConfig> {
    let raw = raw
        .ok_or_else(|| AppError::Config("missing 'mongodb' section in config file".to_string()))?;
    let username = raw.username.clone().filter(|u| !u.is_empty());
    // The password is only required when authentication is configured.
    let password = match &username {
        Some(_) => Some(require_secret(env, "MONGODB_PASSWORD")?),
        None => None,
    };
    Ok(MongodbConfig {
        host: raw.host.clone().unwrap_or_else(|| "localhost".to_string()),
        port: raw.port.unwrap_or(27017),
        username,
        password,
        auth_database: raw
            .auth_database
            .clone()
            .unwrap_or_else(|| "admin".to_string()),
        gzip: raw.gzip.unwrap_or(true),
    })
}
