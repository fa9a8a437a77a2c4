//! Backup artifact naming.
//!
//! Artifacts carry their own metadata in the filename:
//! `<db_type>_<db_name>_full_<YYYY-MM-DD>_<HH-MM-SS>.<ext>`, optionally
//! suffixed with `.tar.gz`/`.tar` when compressed. Decoding recovers the
//! database name so `restore` can work without an explicit `--db-name`.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::databases::DatabaseType;

/// `db_name` is captured non-greedily so names containing underscores are
/// preserved up to the last point where the fixed `_full_<timestamp>` suffix
/// still matches. Seconds are optional for older artifacts.
static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:postgres|mysql|sqlite|mongodb)_(.+?)_full_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}(?:-\d{2})?$",
    )
    .expect("artifact name pattern is valid")
});

/// Longest suffix first, so a combined `.tar.gz` is stripped before `.tar`.
const STRIP_SUFFIXES: &[&str] = &[".tar.gz", ".tar", ".gz", ".sql", ".archive", ".db"];

/// Encodes backup metadata into an artifact filename. Deterministic and
/// pure; the timestamp is truncated to second precision by the format.
pub fn encode(db_type: DatabaseType, db_name: &str, created_at: NaiveDateTime) -> String {
    format!(
        "{}_{}_full_{}.{}",
        db_type,
        db_name,
        created_at.format("%Y-%m-%d_%H-%M-%S"),
        db_type.artifact_extension(),
    )
}

/// Recovers the database name from an artifact filename, or `None` when the
/// filename does not follow the encoding (the caller must then require an
/// explicit name).
///
/// Known ambiguity: a database name that itself ends in an underscore-
/// separated date-like substring can mis-split; the shorter, wrong-but-
/// plausible name is returned silently. This mirrors the encoding's original
/// behaviour and is covered by a test rather than corrected.
pub fn decode_db_name(filename: &str) -> Option<String> {
    let mut name = filename;
    loop {
        let mut stripped = false;
        for suffix in STRIP_SUFFIXES {
            if let Some(rest) = name.strip_suffix(suffix) {
                name = rest;
                stripped = true;
                break;
            }
        }
        if !stripped {
            break;
        }
    }

    ARTIFACT_NAME
        .captures(name)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 7)
            .unwrap()
            .and_hms_opt(23, 45, 12)
            .unwrap()
    }

    #[test]
    fn encode_uses_type_tag_and_extension() {
        assert_eq!(
            encode(DatabaseType::Postgres, "myapp_db", ts()),
            "postgres_myapp_db_full_2026-01-07_23-45-12.sql"
        );
        assert_eq!(
            encode(DatabaseType::Mongodb, "events", ts()),
            "mongodb_events_full_2026-01-07_23-45-12.archive"
        );
        assert_eq!(
            encode(DatabaseType::Sqlite, "app", ts()),
            "sqlite_app_full_2026-01-07_23-45-12.db"
        );
    }

    #[test]
    fn decode_round_trips_encoded_names() {
        for db_type in DatabaseType::ALL {
            let filename = encode(db_type, "my_production_db", ts());
            assert_eq!(
                decode_db_name(&filename).as_deref(),
                Some("my_production_db"),
                "round trip failed for {filename}"
            );
        }
    }

    #[test]
    fn decode_is_non_greedy_over_underscored_names() {
        assert_eq!(
            decode_db_name("postgres_my_production_db_full_2026-01-07_23-45-12.sql.tar").as_deref(),
            Some("my_production_db")
        );
    }

    #[test]
    fn decode_strips_combined_suffix_before_single() {
        assert_eq!(
            decode_db_name("mysql_shop_full_2026-01-07_23-45-12.sql.tar.gz").as_deref(),
            Some("shop")
        );
    }

    #[test]
    fn decode_accepts_minute_precision_artifacts() {
        assert_eq!(
            decode_db_name("postgres_legacy_full_2026-01-07_22-30.sql").as_deref(),
            Some("legacy")
        );
    }

    #[test]
    fn decode_rejects_unrelated_filenames() {
        assert_eq!(decode_db_name("random_file.sql"), None);
        assert_eq!(decode_db_name("postgres_nodate.sql"), None);
        assert_eq!(decode_db_name(""), None);
    }

    // A name that itself ends with a timestamp-like suffix mis-splits: the
    // file below was not produced by `encode`, but it still matches the
    // pattern and decodes to a shorter, plausible name.
    #[test]
    fn decode_timestamp_lookalike_name_is_a_known_ambiguity() {
        assert_eq!(
            decode_db_name("postgres_nightly_full_2026-01-01_00-00-00.sql").as_deref(),
            Some("nightly")
        );
    }
}
