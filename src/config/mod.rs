//! Configuration management.
//!
//! Settings come from CLI flags first and environment variables second.
//! There is no config file.
//!
//! | Variable                  | Meaning                                     |
//! |---------------------------|---------------------------------------------|
//! | `THREADS_DB`              | Database path (same as `--db`)              |
//! | `THREADS_TEST_DB`         | Truthy: use `~/.threads/test/threads.db`    |
//! | `THREADS_DB_PATH`         | Database path fallback                      |
//! | `THREADS_PROJECT`         | Default project for thread commands         |
//! | `THREADS_BUSY_TIMEOUT_MS` | SQLite busy timeout in milliseconds         |

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const DB_FILE: &str = "threads.db";

/// Get the global threads directory: `~/.threads/`.
#[must_use]
pub fn global_threads_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".threads"))
}

/// Whether an environment flag value counts as set.
///
/// Empty, `0` and `false` (any case) are off; anything else is on.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Check if test mode is enabled via `THREADS_TEST_DB`.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("THREADS_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

/// Returns `~/.threads/test/threads.db` for isolated testing.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_threads_dir().map(|dir| dir.join("test").join(DB_FILE))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag, which also reads `THREADS_DB`)
/// 2. `THREADS_TEST_DB` → the test database
/// 3. `THREADS_DB_PATH`
/// 4. `~/.threads/data/threads.db`
///
/// Returns `None` only when no home directory can be found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("THREADS_DB_PATH") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_threads_dir().map(|dir| dir.join("data").join(DB_FILE))
}

/// Resolve the project id for commands that need one.
///
/// # Errors
///
/// Returns [`Error::Config`] when neither `explicit` nor `THREADS_PROJECT`
/// provides a non-blank value.
pub fn resolve_project(explicit: Option<&str>) -> Result<String> {
    if let Some(project) = explicit.filter(|p| !p.trim().is_empty()) {
        return Ok(project.to_string());
    }
    match std::env::var("THREADS_PROJECT") {
        Ok(project) if !project.trim().is_empty() => Ok(project),
        _ => Err(Error::Config(
            "no project given: pass --project or set THREADS_PROJECT".to_string(),
        )),
    }
}

/// Busy timeout from `THREADS_BUSY_TIMEOUT_MS`, if set.
///
/// # Errors
///
/// Returns [`Error::Config`] if the value is not a whole number.
pub fn busy_timeout_ms() -> Result<Option<u64>> {
    match std::env::var("THREADS_BUSY_TIMEOUT_MS") {
        Ok(raw) if !raw.trim().is_empty() => parse_timeout(&raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        Error::Config(format!(
            "THREADS_BUSY_TIMEOUT_MS must be milliseconds, got '{raw}'"
        ))
    })
}

/// A fresh idempotency key for CLI writes: `req_<uuid>`.
#[must_use]
pub fn default_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().simple())
}
