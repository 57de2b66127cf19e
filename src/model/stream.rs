//! Stream: server-side state for a resumable streaming response.

use crate::error::Result;
use crate::model::{MessagePart, StreamStatus};
use crate::storage::schema::{self, Table};
use crate::store::Entity;
use crate::validate::{Validate, require, require_if_present, require_object};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Partial output captured while a stream is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl StreamSnapshot {
    #[must_use]
    pub fn new(parts: Vec<MessagePart>) -> Self {
        Self {
            parts,
            metadata: None,
        }
    }
}

/// A stream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub thread_id: String,
    pub run_id: Option<String>,
    pub status: StreamStatus,
    /// Opaque key a client presents to reconnect.
    pub resume_token: Option<String>,
    pub last_event_id: Option<String>,
    pub snapshot: Option<StreamSnapshot>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Stream {
    /// Active and not past its deadline at `now`.
    #[must_use]
    pub fn is_resumable_at(&self, now: i64) -> bool {
        !self.status.is_terminal() && self.expires_at.is_none_or(|at| at >= now)
    }

    /// Active with a deadline strictly before `now`.
    #[must_use]
    pub fn is_stale_at(&self, now: i64) -> bool {
        !self.status.is_terminal() && self.expires_at.is_some_and(|at| at < now)
    }
}

/// Insert payload for a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStream {
    pub thread_id: String,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: StreamStatus,
    #[serde(default)]
    pub resume_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Validate for NewStream {
    fn validate(&self) -> Result<()> {
        require("stream", "thread_id", &self.thread_id)?;
        require_if_present("stream", "run_id", self.run_id.as_deref())?;
        require_if_present("stream", "resume_token", self.resume_token.as_deref())
    }
}

/// Partial update for a stream. Only set fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StreamStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StreamSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Validate for StreamPatch {
    fn validate(&self) -> Result<()> {
        require_if_present("stream", "resume_token", self.resume_token.as_deref())?;
        if let Some(snapshot) = &self.snapshot {
            require_object("stream", snapshot.metadata.as_ref())?;
        }
        Ok(())
    }
}

impl Entity for Stream {
    type New = NewStream;
    type Patch = StreamPatch;

    const NAME: &'static str = "stream";
    const TABLE: &'static Table = &schema::STREAMS;

    fn from_new(new: NewStream, id: String, now: i64) -> Self {
        Self {
            id,
            thread_id: new.thread_id,
            run_id: new.run_id,
            status: new.status,
            resume_token: new.resume_token,
            last_event_id: None,
            snapshot: None,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(status: StreamStatus, expires_at: Option<i64>) -> Stream {
        let mut s = Stream::from_new(
            NewStream {
                thread_id: "t".to_string(),
                expires_at,
                ..NewStream::default()
            },
            "s".to_string(),
            0,
        );
        s.status = status;
        s
    }

    #[test]
    fn test_resumable_window() {
        let s = stream(StreamStatus::Active, Some(100));
        assert!(s.is_resumable_at(99));
        assert!(s.is_resumable_at(100));
        assert!(!s.is_resumable_at(101));

        assert!(stream(StreamStatus::Active, None).is_resumable_at(i64::MAX));
        assert!(!stream(StreamStatus::Completed, None).is_resumable_at(0));
    }

    #[test]
    fn test_stale_only_when_past_deadline() {
        let s = stream(StreamStatus::Active, Some(100));
        assert!(!s.is_stale_at(100));
        assert!(s.is_stale_at(101));
        assert!(!stream(StreamStatus::Active, None).is_stale_at(i64::MAX));
        assert!(!stream(StreamStatus::Aborted, Some(0)).is_stale_at(1));
    }

    #[test]
    fn test_snapshot_metadata_must_be_object() {
        let patch = StreamPatch {
            snapshot: Some(StreamSnapshot {
                parts: vec![],
                metadata: Some(serde_json::json!(3)),
            }),
            ..StreamPatch::default()
        };
        assert!(patch.validate().is_err());
    }
}
