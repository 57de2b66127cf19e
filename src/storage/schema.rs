//! Database schema definitions.
//!
//! Holds the DDL for both supported dialects and the column metadata the
//! generic backend needs to convert between SQL values and JSON rows.
//!
//! Note: Timestamps are stored as INTEGER (Unix milliseconds) in SQLite and
//! BIGINT in Postgres. JSON columns are TEXT in SQLite and JSONB in Postgres.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// How a column's values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    /// Serialized JSON in a TEXT column.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Integer,
    }
}

const fn json(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Json,
    }
}

/// A table definition: name, primary key and the full column list.
#[derive(Debug, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub const THREADS: Table = Table {
    name: "threads",
    primary_key: "id",
    columns: &[
        text("id"),
        text("project_id"),
        text("scope_type"),
        text("scope_id"),
        text("title"),
        json("metadata"),
        integer("created_at"),
        integer("updated_at"),
    ],
};

pub const ITEMS: Table = Table {
    name: "items",
    primary_key: "id",
    columns: &[
        text("id"),
        text("thread_id"),
        text("role"),
        json("parts"),
        text("run_id"),
        text("span_id"),
        text("parent_id"),
        text("visibility"),
        integer("attempt"),
        text("request_id"),
        json("metadata"),
        integer("created_at"),
    ],
};

pub const EDGES: Table = Table {
    name: "edges",
    primary_key: "id",
    columns: &[
        text("id"),
        text("thread_id"),
        text("from_item_id"),
        text("to_item_id"),
        text("type"),
        text("request_id"),
        integer("created_at"),
    ],
};

pub const STREAMS: Table = Table {
    name: "streams",
    primary_key: "id",
    columns: &[
        text("id"),
        text("thread_id"),
        text("run_id"),
        text("status"),
        text("resume_token"),
        text("last_event_id"),
        json("snapshot"),
        integer("expires_at"),
        integer("created_at"),
        integer("updated_at"),
    ],
};

/// Every table, parents before children.
pub const ALL_TABLES: [&Table; 4] = [&THREADS, &ITEMS, &EDGES, &STREAMS];

/// The complete SQLite schema.
pub const SCHEMA_SQL: &str = r#"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Threads: containers for activity, polymorphically scoped via scope_type + scope_id
CREATE TABLE IF NOT EXISTS threads (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    scope_type TEXT,
    scope_id TEXT,
    title TEXT,
    metadata TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threads_scope ON threads(project_id, scope_type, scope_id);
CREATE INDEX IF NOT EXISTS idx_threads_project ON threads(project_id);

-- Items: append-only event log; UUIDv7 ids give time order
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user'
        CHECK (role IN ('user', 'assistant', 'system', 'tool')),
    parts TEXT NOT NULL DEFAULT '[]',
    run_id TEXT,
    span_id TEXT,
    parent_id TEXT,
    visibility TEXT NOT NULL DEFAULT 'visible'
        CHECK (visibility IN ('visible', 'hidden', 'archived')),
    attempt INTEGER NOT NULL DEFAULT 1,
    request_id TEXT NOT NULL,
    metadata TEXT,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_items_thread ON items(thread_id, id);
CREATE INDEX IF NOT EXISTS idx_items_run ON items(thread_id, run_id);
CREATE INDEX IF NOT EXISTS idx_items_span ON items(thread_id, span_id);

-- Edges: DAG dependencies between items
CREATE TABLE IF NOT EXISTS edges (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL,
    from_item_id TEXT NOT NULL,
    to_item_id TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'depends_on'
        CHECK (type IN ('depends_on', 'caused_by')),
    request_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE,
    FOREIGN KEY (from_item_id) REFERENCES items(id) ON DELETE CASCADE,
    FOREIGN KEY (to_item_id) REFERENCES items(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_edges_thread ON edges(thread_id);
CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_item_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_item_id);

-- Streams: state for resumable streaming
CREATE TABLE IF NOT EXISTS streams (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL,
    run_id TEXT,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'completed', 'aborted', 'expired')),
    resume_token TEXT,
    last_event_id TEXT,
    snapshot TEXT,
    expires_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_streams_thread ON streams(thread_id);
CREATE INDEX IF NOT EXISTS idx_streams_status ON streams(status);
"#;

/// The same schema for Postgres hosts.
///
/// This crate does not drive Postgres itself; hosts that keep threads in
/// Postgres apply this DDL with their own tooling and implement
/// [`crate::storage::Backend`] over their client.
pub const POSTGRES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    scope_type TEXT,
    scope_id TEXT,
    title TEXT,
    metadata JSONB,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threads_scope ON threads(project_id, scope_type, scope_id);
CREATE INDEX IF NOT EXISTS idx_threads_project ON threads(project_id);

CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    role TEXT NOT NULL DEFAULT 'user'
        CHECK (role IN ('user', 'assistant', 'system', 'tool')),
    parts JSONB NOT NULL DEFAULT '[]'::jsonb,
    run_id TEXT,
    span_id TEXT,
    parent_id TEXT,
    visibility TEXT NOT NULL DEFAULT 'visible'
        CHECK (visibility IN ('visible', 'hidden', 'archived')),
    attempt INTEGER NOT NULL DEFAULT 1,
    request_id TEXT NOT NULL,
    metadata JSONB,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_thread ON items(thread_id, id);
CREATE INDEX IF NOT EXISTS idx_items_run ON items(thread_id, run_id);
CREATE INDEX IF NOT EXISTS idx_items_span ON items(thread_id, span_id);

CREATE TABLE IF NOT EXISTS edges (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    from_item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    to_item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    type TEXT NOT NULL DEFAULT 'depends_on'
        CHECK (type IN ('depends_on', 'caused_by')),
    request_id TEXT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_edges_thread ON edges(thread_id);
CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_item_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_item_id);

CREATE TABLE IF NOT EXISTS streams (
    id TEXT PRIMARY KEY NOT NULL,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    run_id TEXT,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'completed', 'aborted', 'expired')),
    resume_token TEXT,
    last_event_id TEXT,
    snapshot JSONB,
    expires_at BIGINT,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_streams_thread ON streams(thread_id);
CREATE INDEX IF NOT EXISTS idx_streams_status ON streams(status);
CREATE INDEX IF NOT EXISTS idx_streams_resume_token ON streams(resume_token);
CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_id);

CREATE OR REPLACE FUNCTION streams_terminal_guard() RETURNS trigger AS $$
BEGIN
    IF OLD.status <> 'active' AND NEW.status <> OLD.status THEN
        RAISE EXCEPTION 'terminal stream status cannot change';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS streams_terminal_guard ON streams;
CREATE TRIGGER streams_terminal_guard
    BEFORE UPDATE OF status ON streams
    FOR EACH ROW EXECUTE FUNCTION streams_terminal_guard();
"#;

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Set pragmas before schema creation
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?; // cascades depend on this
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    // Run migrations for existing databases
    super::migrations::run_migrations(conn)?;

    // Record schema version
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
