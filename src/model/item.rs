//! Item: one immutable event in a thread's append-only log.
//!
//! Items are never rewritten. The only mutable column is `visibility`,
//! which is why [`ItemPatch`] carries nothing else.

use crate::error::{Error, Result};
use crate::model::thread::decode_metadata;
use crate::model::{MessagePart, Role, Visibility, joined_text};
use crate::storage::schema::{self, Table};
use crate::store::Entity;
use crate::validate::{Validate, require, require_if_present, require_object};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    /// Groups items produced by one agent execution.
    pub run_id: Option<String>,
    /// Groups items into a DAG node.
    pub span_id: Option<String>,
    /// Reply-to reference. Not a foreign key.
    pub parent_id: Option<String>,
    pub visibility: Visibility,
    pub attempt: i64,
    pub request_id: String,
    pub metadata: Option<Value>,
    pub created_at: i64,
}

impl Item {
    /// All text parts joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        joined_text(&self.parts)
    }

    /// Decode the metadata column into a caller-chosen type.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON does not match `T`.
    pub fn metadata_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        decode_metadata(self.metadata.as_ref())
    }
}

fn default_attempt() -> i64 {
    1
}

/// Insert payload for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub thread_id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub span_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_attempt")]
    pub attempt: i64,
    pub request_id: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl NewItem {
    pub fn new(
        thread_id: impl Into<String>,
        role: Role,
        parts: Vec<MessagePart>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            role,
            parts,
            run_id: None,
            span_id: None,
            parent_id: None,
            visibility: Visibility::Visible,
            attempt: default_attempt(),
            request_id: request_id.into(),
            metadata: None,
        }
    }

    /// A single-text-part item.
    pub fn text(
        thread_id: impl Into<String>,
        role: Role,
        text: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self::new(thread_id, role, vec![MessagePart::text(text)], request_id)
    }

    #[must_use]
    pub fn run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    #[must_use]
    pub fn span(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    #[must_use]
    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
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

impl Validate for NewItem {
    fn validate(&self) -> Result<()> {
        require("item", "thread_id", &self.thread_id)?;
        require("item", "request_id", &self.request_id)?;
        require_if_present("item", "run_id", self.run_id.as_deref())?;
        require_if_present("item", "span_id", self.span_id.as_deref())?;
        require_if_present("item", "parent_id", self.parent_id.as_deref())?;
        if self.attempt < 1 {
            return Err(Error::validation(
                "item",
                format!("attempt must be at least 1, got {}", self.attempt),
            ));
        }
        if let Some(problem) = self.parts.iter().find_map(MessagePart::problem) {
            return Err(Error::validation("item", problem));
        }
        require_object("item", self.metadata.as_ref())
    }
}

/// Partial update for an item. Visibility is the only mutable column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl Validate for ItemPatch {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Entity for Item {
    type New = NewItem;
    type Patch = ItemPatch;

    const NAME: &'static str = "item";
    const TABLE: &'static Table = &schema::ITEMS;

    fn from_new(new: NewItem, id: String, now: i64) -> Self {
        Self {
            id,
            thread_id: new.thread_id,
            role: new.role,
            parts: new.parts,
            run_id: new.run_id,
            span_id: new.span_id,
            parent_id: new.parent_id,
            visibility: new.visibility,
            attempt: new.attempt,
            request_id: new.request_id,
            metadata: new.metadata,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_defaults() {
        let new: NewItem = serde_json::from_value(json!({
            "thread_id": "t1",
            "request_id": "r1",
            "parts": [{"type": "text", "text": "hi"}]
        }))
        .unwrap();
        assert_eq!(new.role, Role::User);
        assert_eq!(new.visibility, Visibility::Visible);
        assert_eq!(new.attempt, 1);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let base = NewItem::text("t1", Role::User, "hi", "r1");

        let no_request = NewItem {
            request_id: String::new(),
            ..base.clone()
        };
        assert!(no_request.validate().unwrap_err().to_string().contains("request_id"));

        let zero_attempt = NewItem {
            attempt: 0,
            ..base.clone()
        };
        assert!(zero_attempt.validate().unwrap_err().to_string().contains("attempt"));

        let bad_part = NewItem {
            parts: vec![MessagePart::File {
                data: "s3://bucket/key".to_string(),
                mime_type: String::new(),
                name: None,
            }],
            ..base
        };
        assert!(bad_part.validate().unwrap_err().to_string().contains("mimeType"));
    }

    #[test]
    fn test_item_text() {
        let item = Item::from_new(
            NewItem::new(
                "t1",
                Role::Assistant,
                vec![MessagePart::text("one"), MessagePart::text("two")],
                "r1",
            ),
            "i1".to_string(),
            0,
        );
        assert_eq!(item.text(), "one\ntwo");
    }
}
