//! Initialize a threads database.
//!
//! Creates the parent directory, opens the database (which applies the
//! schema and any pending migrations) and reports what was done. With
//! `--force` an existing database and its WAL files are removed first.

use crate::config::{busy_timeout_ms, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteBackend;
use crate::storage::migrations::applied_versions;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    schema_version: i32,
    migrations: Vec<String>,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the database exists and `force`
/// is not set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine a database location".to_string()))?;

    let output = initialize(&db_path, force)?;

    if json {
        super::print_json(&output)?;
    } else {
        if output.recreated {
            println!("Recreated threads database");
        } else {
            println!("Initialized threads database");
        }
        println!("  Database: {}", output.database.display());
        println!("  Schema:   v{}", output.schema_version);
    }

    Ok(())
}

fn initialize(db_path: &Path, force: bool) -> Result<InitOutput> {
    let exists = db_path.exists();
    if exists && !force {
        return Err(Error::AlreadyInitialized {
            path: db_path.to_path_buf(),
        });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if exists {
        info!(path = %db_path.display(), "Removing existing database");
        remove_database(db_path)?;
    }

    let backend = SqliteBackend::open_with_timeout(db_path, busy_timeout_ms()?)?;
    let mut migrations: Vec<String> = applied_versions(backend.conn())?
        .into_iter()
        .filter(|v| !v.starts_with('v'))
        .collect();
    migrations.sort();

    Ok(InitOutput {
        database: db_path.to_path_buf(),
        schema_version: CURRENT_SCHEMA_VERSION,
        migrations,
        recreated: exists,
    })
}

fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewThread;
    use crate::store::ThreadsModel;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("threads.db");

        let output = initialize(&path, false).unwrap();
        assert!(path.exists());
        assert!(!output.recreated);
        assert_eq!(
            output.migrations,
            vec![
                "001_add_lookup_indexes".to_string(),
                "002_terminal_stream_guard".to_string()
            ]
        );
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("threads.db");

        initialize(&path, false).unwrap();
        let result = initialize(&path, false);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_recreates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("threads.db");

        initialize(&path, false).unwrap();
        {
            let backend = SqliteBackend::open(&path).unwrap();
            ThreadsModel::new(&backend)
                .insert(vec![NewThread::new("p1")])
                .unwrap();
        }

        let output = initialize(&path, true).unwrap();
        assert!(output.recreated);

        let backend = SqliteBackend::open(&path).unwrap();
        assert!(ThreadsModel::new(&backend).select(&[]).unwrap().is_empty());
    }
}
