//! SQLite storage implementation.
//!
//! [`SqliteBackend`] implements [`Backend`] over a single rusqlite
//! connection. SQL is generated from the [`Table`] definitions in
//! [`crate::storage::schema`], with every identifier checked against the
//! declared columns and double-quoted.

use crate::error::{Error, Result};
use crate::storage::backend::{Backend, Condition, Row, check_columns};
use crate::storage::schema::{Column, ColumnKind, Table, apply_schema};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use serde_json::{Number, Value};
use std::path::Path;
use std::time::Duration;
use tracing::trace;

/// Default busy timeout when none is configured.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(
            timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        ))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn query_rows(&self, table: &Table, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        trace!(sql, params = params.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map(params_from_iter(params), |row| read_raw(row, table.columns.len()))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(|values| decode_row(table, values)).collect()
    }
}

impl Backend for SqliteBackend {
    fn select(&self, table: &Table, conditions: &[Condition]) -> Result<Vec<Row>> {
        let mut params = Vec::new();
        let filter = where_clause(table, conditions, &mut params)?;
        let sql = format!(
            "SELECT {} FROM {}{filter}",
            column_list(table),
            quote(table.name)
        );
        self.query_rows(table, &sql, params)
    }

    fn insert(&self, table: &Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in &rows {
            check_columns(table, row.keys().map(String::as_str))?;
        }

        // Dropping the transaction without commit rolls back.
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let sql = if row.is_empty() {
                format!(
                    "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                    quote(table.name),
                    column_list(table)
                )
            } else {
                let names: Vec<String> = row.keys().map(|k| quote(k)).collect();
                let marks = vec!["?"; row.len()].join(", ");
                format!(
                    "INSERT INTO {} ({}) VALUES ({marks}) RETURNING {}",
                    quote(table.name),
                    names.join(", "),
                    column_list(table)
                )
            };
            let params = row
                .iter()
                .map(|(name, value)| encode(table, name, value))
                .collect::<Result<Vec<_>>>()?;

            trace!(sql = %sql, "insert");
            let raw = tx.query_row(&sql, params_from_iter(params), |r| {
                read_raw(r, table.columns.len())
            })?;
            inserted.push(decode_row(table, raw)?);
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn update(&self, table: &Table, conditions: &[Condition], patch: Row) -> Result<Vec<Row>> {
        if patch.is_empty() {
            return Err(Error::validation(table.name, "update patch is empty"));
        }
        check_columns(table, patch.keys().map(String::as_str))?;

        let mut params = Vec::with_capacity(patch.len());
        let mut assignments = Vec::with_capacity(patch.len());
        for (name, value) in &patch {
            assignments.push(format!("{} = ?", quote(name)));
            params.push(encode(table, name, value)?);
        }
        let filter = where_clause(table, conditions, &mut params)?;
        let sql = format!(
            "UPDATE {} SET {}{filter} RETURNING {}",
            quote(table.name),
            assignments.join(", "),
            column_list(table)
        );
        self.query_rows(table, &sql, params)
    }

    fn delete(&self, table: &Table, conditions: &[Condition]) -> Result<usize> {
        let mut params = Vec::new();
        let filter = where_clause(table, conditions, &mut params)?;
        let sql = format!("DELETE FROM {}{filter}", quote(table.name));
        trace!(sql = %sql, "delete");
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quote(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render conditions as ` WHERE ...`, or an empty string for none.
fn where_clause(table: &Table, conditions: &[Condition], params: &mut Vec<SqlValue>) -> Result<String> {
    if conditions.is_empty() {
        return Ok(String::new());
    }
    check_columns(table, conditions.iter().map(Condition::column))?;

    let mut predicates = Vec::with_capacity(conditions.len());
    for condition in conditions {
        match condition {
            Condition::Eq { column, value } if value.is_null() => {
                predicates.push(format!("{} IS NULL", quote(column)));
            }
            Condition::Eq { column, value } => {
                predicates.push(format!("{} = ?", quote(column)));
                params.push(encode(table, column, value)?);
            }
            Condition::In { values, .. } if values.is_empty() => {
                predicates.push("0 = 1".to_string());
            }
            Condition::In { column, values } => {
                let marks = vec!["?"; values.len()].join(", ");
                predicates.push(format!("{} IN ({marks})", quote(column)));
                for value in values {
                    params.push(encode(table, column, value)?);
                }
            }
        }
    }
    Ok(format!(" WHERE {}", predicates.join(" AND ")))
}

fn declared<'t>(table: &'t Table, name: &str) -> Result<&'t Column> {
    table.column(name).ok_or_else(|| Error::UnknownColumn {
        table: table.name.to_string(),
        column: name.to_string(),
    })
}

/// Convert a JSON value into the SQL value its column stores.
fn encode(table: &Table, name: &str, value: &Value) -> Result<SqlValue> {
    let column = declared(table, name)?;
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match column.kind {
        ColumnKind::Json => Ok(SqlValue::Text(serde_json::to_string(value)?)),
        ColumnKind::Integer => match value {
            Value::Number(n) => n.as_i64().map(SqlValue::Integer).ok_or_else(|| {
                Error::validation(table.name, format!("{name} must be an integer, got {n}"))
            }),
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            other => Err(Error::validation(
                table.name,
                format!("{name} must be an integer, got {other}"),
            )),
        },
        ColumnKind::Text => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Number(_) | Value::Bool(_) => Ok(SqlValue::Text(value.to_string())),
            other => Err(Error::validation(
                table.name,
                format!("{name} must be a string, got {other}"),
            )),
        },
    }
}

fn read_raw(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
    (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

/// Pair raw values with their declared columns. The statement selected
/// `table.columns` in declaration order.
fn decode_row(table: &Table, values: Vec<SqlValue>) -> Result<Row> {
    let mut row = Row::new();
    for (column, value) in table.columns.iter().zip(values) {
        row.insert(column.name.to_string(), decode(column, value)?);
    }
    Ok(row)
}

fn decode(column: &Column, value: SqlValue) -> Result<Value> {
    Ok(match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        SqlValue::Text(s) if column.kind == ColumnKind::Json => serde_json::from_str(&s)?,
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::from(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{ITEMS, THREADS};
    use serde_json::json;
    use tempfile::TempDir;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn thread_row(id: &str, project: &str, scope: Option<&str>) -> Row {
        row(json!({
            "id": id,
            "project_id": project,
            "scope_type": scope.map(|_| "ticket"),
            "scope_id": scope,
            "metadata": {"source": "test"},
            "created_at": 1,
            "updated_at": 1
        }))
    }

    #[test]
    fn test_open_memory() {
        let backend = SqliteBackend::open_memory();
        assert!(backend.is_ok());
    }

    #[test]
    fn test_open_file_applies_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("threads.db");
        let backend = SqliteBackend::open_with_timeout(&path, Some(250)).unwrap();
        assert!(path.exists());
        assert!(backend.select(&THREADS, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_insert_returns_rows_in_order_with_json_decoded() {
        let backend = SqliteBackend::open_memory().unwrap();
        let rows = backend
            .insert(
                &THREADS,
                vec![thread_row("b", "p", None), thread_row("a", "p", Some("T-1"))],
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], json!("b"));
        assert_eq!(rows[1]["id"], json!("a"));
        assert_eq!(rows[1]["metadata"], json!({"source": "test"}));
        assert_eq!(rows[0]["title"], Value::Null);
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let backend = SqliteBackend::open_memory().unwrap();
        let result = backend.insert(
            &THREADS,
            vec![thread_row("dup", "p", None), thread_row("dup", "p", None)],
        );
        assert!(matches!(result, Err(Error::Database(_))));
        assert!(backend.select(&THREADS, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_insert_fills_defaults() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend.insert(&THREADS, vec![thread_row("t", "p", None)]).unwrap();
        let rows = backend
            .insert(
                &ITEMS,
                vec![row(json!({
                    "id": "i1",
                    "thread_id": "t",
                    "request_id": "r",
                    "created_at": 5
                }))],
            )
            .unwrap();
        assert_eq!(rows[0]["role"], json!("user"));
        assert_eq!(rows[0]["visibility"], json!("visible"));
        assert_eq!(rows[0]["attempt"], json!(1));
        assert_eq!(rows[0]["parts"], json!([]));
    }

    #[test]
    fn test_conditions() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend
            .insert(
                &THREADS,
                vec![
                    thread_row("t1", "p1", Some("A")),
                    thread_row("t2", "p1", None),
                    thread_row("t3", "p2", Some("B")),
                ],
            )
            .unwrap();

        let null_scope = backend
            .select(&THREADS, &[Condition::eq("scope_id", Value::Null)])
            .unwrap();
        assert_eq!(null_scope.len(), 1);
        assert_eq!(null_scope[0]["id"], json!("t2"));

        let both = backend
            .select(
                &THREADS,
                &[
                    Condition::eq("project_id", "p1"),
                    Condition::is_in("id", ["t1", "t3"]),
                ],
            )
            .unwrap();
        assert_eq!(both.len(), 1);

        let none = backend
            .select(&THREADS, &[Condition::is_in("id", Vec::<String>::new())])
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_unknown_column_rejected() {
        let backend = SqliteBackend::open_memory().unwrap();
        let err = backend
            .select(&THREADS, &[Condition::eq("id; DROP TABLE threads", "x")])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));

        let err = backend
            .insert(&THREADS, vec![row(json!({"id": "x", "owner": "me"}))])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }

    #[test]
    fn test_update_and_delete() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend
            .insert(
                &THREADS,
                vec![thread_row("t1", "p", None), thread_row("t2", "p", None)],
            )
            .unwrap();

        let updated = backend
            .update(
                &THREADS,
                &[Condition::eq("id", "t1")],
                row(json!({"title": "Renamed", "updated_at": 9})),
            )
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["title"], json!("Renamed"));
        assert_eq!(updated[0]["updated_at"], json!(9));

        let missing = backend
            .update(&THREADS, &[Condition::eq("id", "nope")], row(json!({"title": "x"})))
            .unwrap();
        assert!(missing.is_empty());

        assert!(backend.update(&THREADS, &[], Row::new()).is_err());

        assert_eq!(backend.delete(&THREADS, &[Condition::eq("id", "t1")]).unwrap(), 1);
        assert_eq!(backend.select(&THREADS, &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_cascade_delete() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend.insert(&THREADS, vec![thread_row("t", "p", None)]).unwrap();
        backend
            .insert(
                &ITEMS,
                vec![row(json!({
                    "id": "i1",
                    "thread_id": "t",
                    "request_id": "r",
                    "created_at": 1
                }))],
            )
            .unwrap();

        backend.delete(&THREADS, &[Condition::eq("id", "t")]).unwrap();
        assert!(backend.select(&ITEMS, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_encode_type_mismatch() {
        let err = encode(&THREADS, "created_at", &json!("yesterday")).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(
            encode(&THREADS, "metadata", &json!({"a": 1})).unwrap(),
            SqlValue::Text(r#"{"a":1}"#.to_string())
        );
    }
}
