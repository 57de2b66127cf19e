//! The database capability the models are written against.
//!
//! A backend knows how to run four statement shapes against a [`Table`]:
//! select, insert, update and delete, each filtered by a conjunction of
//! [`Condition`]s. Rows cross the boundary as JSON maps keyed by column
//! name, so the same models work over any engine that implements the trait.

use crate::error::{Error, Result};
use crate::storage::schema::Table;
use serde_json::{Map, Value};

/// One database row, keyed by column name.
pub type Row = Map<String, Value>;

/// A single predicate. A list of conditions is ANDed together.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`, or `column IS NULL` when `value` is null.
    Eq { column: String, value: Value },
    /// `column IN (values)`. An empty list matches nothing.
    In { column: String, values: Vec<Value> },
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }
}

/// A named filter with any number of accepted values.
///
/// See [`crate::store::ModelFactory::build_conditions`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub values: Vec<Value>,
}

impl Filter {
    pub fn new<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query execution over some relational engine.
///
/// Methods take `&self` so one handle can serve every model at once.
/// Errors from the engine are surfaced unchanged.
pub trait Backend {
    /// Rows matching every condition. No ordering is guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns or engine failure.
    fn select(&self, table: &Table, conditions: &[Condition]) -> Result<Vec<Row>>;

    /// Insert all rows or none. Returned rows are in input order with
    /// database defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns or engine failure.
    fn insert(&self, table: &Table, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Apply `patch` to every matching row and return the updated rows.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns, an empty patch or engine failure.
    fn update(&self, table: &Table, conditions: &[Condition], patch: Row) -> Result<Vec<Row>>;

    /// Delete every matching row, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown columns or engine failure.
    fn delete(&self, table: &Table, conditions: &[Condition]) -> Result<usize>;
}

/// Reject column names the table does not declare.
///
/// # Errors
///
/// Returns [`Error::UnknownColumn`] for the first unknown name.
pub fn check_columns<'a>(table: &Table, columns: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for column in columns {
        if table.column(column).is_none() {
            return Err(Error::UnknownColumn {
                table: table.name.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
