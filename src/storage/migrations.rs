//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded into the binary using `include_str!`, so the binary carries
//! no runtime file dependencies.

use rusqlite::{Connection, Result};
use std::collections::HashSet;
use tracing::{debug, info};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order.
///
/// Version names match the SQL filenames (without .sql extension).
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_add_lookup_indexes",
        sql: include_str!("../../migrations/001_add_lookup_indexes.sql"),
    },
    Migration {
        version: "002_terminal_stream_guard",
        sql: include_str!("../../migrations/002_terminal_stream_guard.sql"),
    },
];

/// Versions already recorded in `schema_migrations`.
///
/// # Errors
///
/// Returns an error if the tracking table cannot be read.
pub fn applied_versions(conn: &Connection) -> Result<HashSet<String>> {
    conn.prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect()
}

/// Run all pending migrations on the database.
///
/// Already-applied migrations are skipped, so this is safe to call on every
/// open. Each migration and its tracking row commit together.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied = applied_versions(conn)?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            debug!(version = migration.version, "Migration already applied");
            continue;
        }

        info!(version = migration.version, "Applying migration");

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::SCHEMA_SQL;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).expect("Base schema should apply");
        conn
    }

    fn index_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = setup_db();
        run_migrations(&conn).expect("Migrations should apply to fresh database");

        let applied = applied_versions(&conn).unwrap();
        assert_eq!(applied.len(), MIGRATIONS.len());
        assert!(applied.contains("001_add_lookup_indexes"));
        assert!(index_exists(&conn, "idx_streams_resume_token"));
        assert!(index_exists(&conn, "idx_items_parent"));
        assert!(applied.contains("002_terminal_stream_guard"));
    }

    #[test]
    fn test_terminal_stream_guard_trigger() {
        let conn = setup_db();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO threads (id, project_id, created_at, updated_at) VALUES ('t', 'p', 0, 0);
             INSERT INTO streams (id, thread_id, status, created_at, updated_at)
                 VALUES ('s', 't', 'active', 0, 0);",
        )
        .unwrap();

        conn.execute("UPDATE streams SET status = 'completed' WHERE id = 's'", [])
            .expect("active -> completed is allowed");
        conn.execute("UPDATE streams SET status = 'completed' WHERE id = 's'", [])
            .expect("same status is not a transition");
        let err = conn
            .execute("UPDATE streams SET status = 'active' WHERE id = 's'", [])
            .unwrap_err();
        assert!(err.to_string().contains("terminal stream"));

        conn.execute("UPDATE streams SET resume_token = 'tok' WHERE id = 's'", [])
            .expect("other columns stay writable");
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = setup_db();
        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, i64::try_from(MIGRATIONS.len()).unwrap());
    }
}
