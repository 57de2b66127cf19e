//! Generic typed CRUD over any [`Entity`].
//!
//! Every write operation is many-first: `insert` takes a batch, `update`
//! and `delete` act on every row matching the conditions. Single-record
//! helpers on the per-entity models are thin wrappers that take the first
//! row of a batch.

use crate::error::{Error, Result};
use crate::model::{new_id, now_millis};
use crate::storage::backend::{Backend, Condition, Filter, Row};
use crate::storage::schema::Table;
use crate::validate::Validate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// A record type stored in one table.
pub trait Entity: Serialize + DeserializeOwned {
    /// Insert payload. Validated strictly before any I/O.
    type New: Validate;
    /// Partial update. Only the fields that are set get written.
    type Patch: Validate + Serialize;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static Table;

    /// Build the full record from an insert payload, a fresh id and the
    /// creation time.
    fn from_new(new: Self::New, id: String, now: i64) -> Self;
}

/// The first row, or [`Error::RecordNotFound`] naming `what`.
///
/// # Errors
///
/// Returns an error if `rows` is empty.
pub fn take_first<T>(rows: Vec<T>, what: &str) -> Result<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| Error::RecordNotFound(what.to_string()))
}

/// CRUD operations for `E`, bound to a backend.
pub struct ModelFactory<'db, E, B: Backend + ?Sized> {
    backend: &'db B,
    entity: PhantomData<fn() -> E>,
}

impl<E, B: Backend + ?Sized> Clone for ModelFactory<'_, E, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, B: Backend + ?Sized> Copy for ModelFactory<'_, E, B> {}

impl<E: Entity, B: Backend + ?Sized> fmt::Debug for ModelFactory<'_, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("table", &E::TABLE.name)
            .finish_non_exhaustive()
    }
}

impl<'db, E: Entity, B: Backend + ?Sized> ModelFactory<'db, E, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            backend,
            entity: PhantomData,
        }
    }

    /// The table this factory reads and writes.
    #[must_use]
    pub const fn table(&self) -> &'static Table {
        E::TABLE
    }

    /// Records matching every condition. An empty list selects all rows.
    /// Order is whatever the backend returns.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns or backend failure.
    pub fn select(&self, conditions: &[Condition]) -> Result<Vec<E>> {
        let rows = self.backend.select(E::TABLE, conditions)?;
        debug!(table = E::TABLE.name, conditions = conditions.len(), rows = rows.len(), "select");
        rows.into_iter().map(from_row).collect()
    }

    /// One record by primary key. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn select_by_id(&self, id: &str) -> Result<Option<E>> {
        let rows = self
            .backend
            .select(E::TABLE, &[Condition::eq(E::TABLE.primary_key, id)])?;
        rows.into_iter().next().map(from_row).transpose()
    }

    /// Validate every payload, then insert them all in one batch.
    ///
    /// If any payload fails validation nothing is sent to the backend.
    /// Returned records are in input order.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or the backend's error.
    pub fn insert(&self, records: Vec<E::New>) -> Result<Vec<E>> {
        for record in &records {
            record.validate()?;
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_millis();
        let rows = records
            .into_iter()
            .map(|new| to_row(&E::from_new(new, new_id(), now)))
            .collect::<Result<Vec<_>>>()?;

        let count = rows.len();
        let inserted = self.backend.insert(E::TABLE, rows)?;
        debug!(table = E::TABLE.name, rows = count, "insert");
        inserted.into_iter().map(from_row).collect()
    }

    /// Apply `patch` to every record matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or empty patch, or the
    /// backend's error.
    pub fn update(&self, conditions: &[Condition], patch: E::Patch) -> Result<Vec<E>> {
        patch.validate()?;
        let row = to_row(&patch)?;
        if row.is_empty() {
            return Err(Error::validation(E::NAME, "nothing to update"));
        }

        let updated = self.backend.update(E::TABLE, conditions, row)?;
        debug!(table = E::TABLE.name, rows = updated.len(), "update");
        updated.into_iter().map(from_row).collect()
    }

    /// Delete every record matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns or backend failure.
    pub fn delete(&self, conditions: &[Condition]) -> Result<()> {
        let removed = self.backend.delete(E::TABLE, conditions)?;
        debug!(table = E::TABLE.name, rows = removed, "delete");
        Ok(())
    }

    /// One `IN` condition per filter. Filters with no values are skipped.
    #[must_use]
    pub fn build_conditions(&self, filters: impl IntoIterator<Item = Filter>) -> Vec<Condition> {
        filters
            .into_iter()
            .filter(|f| !f.values.is_empty())
            .map(|f| Condition::In {
                column: f.column,
                values: f.values,
            })
            .collect()
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Other(format!("expected a JSON object row, got {other}"))),
    }
}

fn from_row<E: DeserializeOwned>(row: Row) -> Result<E> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
