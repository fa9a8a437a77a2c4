//! Handler factory: maps a database type tag to a constructed handler.
//! Construction only binds configuration; tool and connectivity validation
//! is the orchestrators' job, performed explicitly afterwards.

use crate::config::AppConfig;
use crate::errors::Result;

use super::mongodb::MongodbHandler;
use super::mysql::MysqlHandler;
use super::postgres::PostgresHandler;
use super::sqlite::SqliteHandler;
use super::{DatabaseHandler, DatabaseType};

/// The match is exhaustive over the closed tag set, so the lookup is total
/// by construction; unknown tag strings are rejected earlier, when parsing
/// into `DatabaseType`.
pub fn get_handler(db_type: DatabaseType, config: &AppConfig) -> Result<Box<dyn DatabaseHandler>> {
    Ok(match db_type {
        DatabaseType::Postgres => Box::new(PostgresHandler::new(config.postgres()?)),
        DatabaseType::Mysql => Box::new(MysqlHandler::new(config.mysql()?)),
        DatabaseType::Sqlite => Box::new(SqliteHandler::new(config.sqlite()?)),
        DatabaseType::Mongodb => Box::new(MongodbHandler::new(config.mongodb()?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::fs;
    use std::io::Write;

    fn config_with_all_sections(dir: &std::path::Path) -> AppConfig {
        let path = dir.join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "postgres": {{"host": "localhost", "database": "app"}},
                "mysql": {{"host": "localhost", "database": "shop"}},
                "sqlite": {{"db_path": "{}"}},
                "mongodb": {{"host": "localhost"}}
            }}"#,
            dir.join("data.db").display()
        )
        .unwrap();
        AppConfig::load(Some(&path)).unwrap()
    }

    fn set_test_secrets() {
        // Tests run threaded; setting fixed values is safe because every
        // caller writes the same ones.
        unsafe {
            std::env::set_var("POSTGRES_PASSWORD", "pw");
            std::env::set_var("MYSQL_PASSWORD", "pw");
            std::env::set_var("MONGODB_PASSWORD", "pw");
        }
    }

    #[test]
    fn every_supported_tag_builds_the_matching_variant() {
        set_test_secrets();
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_all_sections(dir.path());

        for db_type in DatabaseType::ALL {
            let handler = get_handler(db_type, &config).unwrap();
            assert_eq!(handler.db_type(), db_type);
        }
    }

    #[test]
    fn missing_section_surfaces_as_config_error() {
        set_test_secrets();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"postgres": {"host": "localhost"}}"#).unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();

        // Boxed handlers carry no Debug impl; drop the success value so the
        // error can be unwrapped.
        let err = get_handler(DatabaseType::Sqlite, &config).map(|_| ()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
