//! Thread: the container for activity.
//!
//! A thread is scoped to a project and optionally to an owning record
//! through the polymorphic `(scope_type, scope_id)` pair, e.g.
//! `("ticket", "T-101")`.

use crate::error::Result;
use crate::model::Item;
use crate::storage::schema::{self, Table};
use crate::store::Entity;
use crate::validate::{Validate, require, require_if_present, require_object};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A thread record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub project_id: String,
    pub scope_type: Option<String>,
    pub scope_id: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Thread {
    /// Decode the metadata column into a caller-chosen type.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON does not match `T`.
    pub fn metadata_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        decode_metadata(self.metadata.as_ref())
    }
}

/// Insert payload for a thread. `id` and timestamps are generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewThread {
    pub project_id: String,
    #[serde(default)]
    pub scope_type: Option<String>,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl NewThread {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scope(mut self, scope_type: impl Into<String>, scope_id: impl Into<String>) -> Self {
        self.scope_type = Some(scope_type.into());
        self.scope_id = Some(scope_id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach typed metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if `metadata` cannot be serialized.
    pub fn with_metadata<T: Serialize>(mut self, metadata: &T) -> Result<Self> {
        self.metadata = Some(serde_json::to_value(metadata)?);
        Ok(self)
    }
}

impl Validate for NewThread {
    fn validate(&self) -> Result<()> {
        require("thread", "project_id", &self.project_id)?;
        require_if_present("thread", "scope_type", self.scope_type.as_deref())?;
        require_if_present("thread", "scope_id", self.scope_id.as_deref())?;
        require_object("thread", self.metadata.as_ref())
    }
}

/// Partial update for a thread. Only set fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Validate for ThreadPatch {
    fn validate(&self) -> Result<()> {
        require_if_present("thread", "project_id", self.project_id.as_deref())?;
        require_object("thread", self.metadata.as_ref())
    }
}

/// The fields `update_thread` is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub metadata: Option<Value>,
}

impl Entity for Thread {
    type New = NewThread;
    type Patch = ThreadPatch;

    const NAME: &'static str = "thread";
    const TABLE: &'static Table = &schema::THREADS;

    fn from_new(new: NewThread, id: String, now: i64) -> Self {
        Self {
            id,
            project_id: new.project_id,
            scope_type: new.scope_type,
            scope_id: new.scope_id,
            title: new.title,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A thread together with its items in ascending id order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadWithItems {
    #[serde(flatten)]
    pub thread: Thread,
    pub items: Vec<Item>,
}

pub(crate) fn decode_metadata<T: DeserializeOwned>(metadata: Option<&Value>) -> Result<Option<T>> {
    match metadata {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
    }
}
