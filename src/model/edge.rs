//! Edge: a directed dependency between two items of the same thread.

use crate::error::Result;
use crate::model::EdgeType;
use crate::storage::schema::{self, Table};
use crate::store::Entity;
use crate::validate::{Validate, require};
use serde::{Deserialize, Serialize};

/// An edge record. `from_item_id -> to_item_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub thread_id: String,
    pub from_item_id: String,
    pub to_item_id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub request_id: String,
    pub created_at: i64,
}

/// Insert payload for an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub thread_id: String,
    pub from_item_id: String,
    pub to_item_id: String,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    pub request_id: String,
}

impl Validate for NewEdge {
    fn validate(&self) -> Result<()> {
        require("edge", "thread_id", &self.thread_id)?;
        require("edge", "from_item_id", &self.from_item_id)?;
        require("edge", "to_item_id", &self.to_item_id)?;
        require("edge", "request_id", &self.request_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgePatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Validate for EdgePatch {
    fn validate(&self) -> Result<()> {
        match self.request_id.as_deref() {
            Some(r) => require("edge", "request_id", r),
            None => Ok(()),
        }
    }
}

impl Entity for Edge {
    type New = NewEdge;
    type Patch = EdgePatch;

    const NAME: &'static str = "edge";
    const TABLE: &'static Table = &schema::EDGES;

    fn from_new(new: NewEdge, id: String, now: i64) -> Self {
        Self {
            id,
            thread_id: new.thread_id,
            from_item_id: new.from_item_id,
            to_item_id: new.to_item_id,
            edge_type: new.edge_type,
            request_id: new.request_id,
            created_at: now,
        }
    }
}

/// One edge of a [`DagStructure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DagEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

/// Graph view of a thread's edges, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DagStructure {
    /// Item ids touched by any edge, deduplicated, in first-seen order.
    pub nodes: Vec<String>,
    pub edges: Vec<DagEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_column_name() {
        let edge = Edge::from_new(
            NewEdge {
                thread_id: "t".to_string(),
                from_item_id: "a".to_string(),
                to_item_id: "b".to_string(),
                edge_type: EdgeType::CausedBy,
                request_id: "r".to_string(),
            },
            "e1".to_string(),
            7,
        );
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["type"], json!("caused_by"));
        assert!(value.get("edge_type").is_none());
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let new: NewEdge = serde_json::from_value(json!({
            "thread_id": "t",
            "from_item_id": "",
            "to_item_id": "b",
            "request_id": "r"
        }))
        .unwrap();
        assert_eq!(new.edge_type, EdgeType::DependsOn);
        assert!(new.validate().unwrap_err().to_string().contains("from_item_id"));
    }
}
