//! Command implementations.

pub mod completions;
pub mod edge;
pub mod init;
pub mod item;
pub mod stream;
pub mod thread;
pub mod version;

use crate::config::{busy_timeout_ms, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::format_timestamp;
use crate::storage::SqliteBackend;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Open an initialized database.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if the database file does not exist.
pub(crate) fn open_backend(db_path: Option<&PathBuf>) -> Result<SqliteBackend> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteBackend::open_with_timeout(&db_path, busy_timeout_ms()?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Parse a `--metadata` argument.
pub(crate) fn parse_metadata(raw: Option<&str>) -> Result<Option<Value>> {
    raw.map(|s| {
        serde_json::from_str(s)
            .map_err(|e| Error::InvalidArgument(format!("--metadata is not valid JSON: {e}")))
    })
    .transpose()
}

/// `YYYY-MM-DD HH:MM:SS` (UTC) for human output.
pub(crate) fn short_time(ts: i64) -> String {
    let full = format_timestamp(ts);
    full.get(..19).map_or(full.clone(), |s| s.replace('T', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata() {
        assert_eq!(parse_metadata(None).unwrap(), None);
        assert_eq!(
            parse_metadata(Some(r#"{"a": 1}"#)).unwrap(),
            Some(json!({"a": 1}))
        );
        assert!(matches!(
            parse_metadata(Some("{oops")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_short_time() {
        assert_eq!(short_time(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_open_backend_requires_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.db");
        assert!(matches!(
            open_backend(Some(&missing)),
            Err(Error::NotInitialized)
        ));
    }
}
