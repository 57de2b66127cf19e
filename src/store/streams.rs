//! Resumable stream state.
//!
//! A stream starts `active` and ends in exactly one of `completed`,
//! `aborted` or `expired`. Terminal transitions are conditional updates on
//! `status = 'active'`. The `streams_terminal_guard` trigger rejects any
//! other write that would change a terminal status.

use crate::error::{Error, Result};
use crate::model::{NewStream, Stream, StreamPatch, StreamSnapshot, StreamStatus, now_millis};
use crate::storage::backend::{Backend, Condition};
use crate::store::factory::{ModelFactory, take_first};
use std::ops::Deref;
use tracing::{info, warn};

/// Lifetime of a stream started without an explicit ttl: five minutes.
pub const DEFAULT_STREAM_TTL_MS: i64 = 5 * 60 * 1000;

/// Stream operations. Derefs to the generic [`ModelFactory`].
#[derive(Debug)]
pub struct StreamsModel<'db, B: Backend + ?Sized> {
    base: ModelFactory<'db, Stream, B>,
}

impl<'db, B: Backend + ?Sized> Deref for StreamsModel<'db, B> {
    type Target = ModelFactory<'db, Stream, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

fn active() -> Condition {
    Condition::eq("status", StreamStatus::Active.as_str())
}

impl<'db, B: Backend + ?Sized> StreamsModel<'db, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            base: ModelFactory::new(backend),
        }
    }

    /// An active stream on the thread, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_active(&self, thread_id: &str) -> Result<Option<Stream>> {
        Ok(self
            .base
            .select(&[Condition::eq("thread_id", thread_id), active()])?
            .into_iter()
            .next())
    }

    /// The stream for a run, in any status.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_by_run(&self, thread_id: &str, run_id: &str) -> Result<Option<Stream>> {
        Ok(self
            .base
            .select(&[
                Condition::eq("thread_id", thread_id),
                Condition::eq("run_id", run_id),
            ])?
            .into_iter()
            .next())
    }

    /// Open a new active stream expiring `expires_in_ms` from now
    /// ([`DEFAULT_STREAM_TTL_MS`] when `None`).
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank ids, or a backend error.
    pub fn start(&self, thread_id: &str, run_id: Option<&str>, expires_in_ms: Option<i64>) -> Result<Stream> {
        let ttl = expires_in_ms.unwrap_or(DEFAULT_STREAM_TTL_MS);
        let stream = NewStream {
            thread_id: thread_id.to_string(),
            run_id: run_id.map(str::to_string),
            status: StreamStatus::Active,
            resume_token: None,
            expires_at: Some(now_millis().saturating_add(ttl)),
        };
        take_first(self.base.insert(vec![stream])?, "stream")
    }

    /// Replace the in-flight snapshot, optionally moving `last_event_id`.
    /// A blank `last_event_id` leaves the stored one unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-object snapshot metadata, or a
    /// backend error.
    pub fn update_snapshot(
        &self,
        id: &str,
        snapshot: StreamSnapshot,
        last_event_id: Option<&str>,
    ) -> Result<Option<Stream>> {
        self.patch(
            id,
            StreamPatch {
                snapshot: Some(snapshot),
                last_event_id: last_event_id
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
                ..StreamPatch::default()
            },
        )
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank token, or a backend error.
    pub fn set_resume_token(&self, id: &str, resume_token: &str) -> Result<Option<Stream>> {
        self.patch(
            id,
            StreamPatch {
                resume_token: Some(resume_token.to_string()),
                ..StreamPatch::default()
            },
        )
    }

    fn patch(&self, id: &str, patch: StreamPatch) -> Result<Option<Stream>> {
        let patch = StreamPatch {
            updated_at: Some(now_millis()),
            ..patch
        };
        Ok(self.base.update(&[Condition::eq("id", id)], patch)?.into_iter().next())
    }

    /// Mark an active stream completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when the stream is already
    /// terminal, or a backend error. A missing stream is `Ok(None)`.
    pub fn complete(&self, id: &str) -> Result<Option<Stream>> {
        self.finish(id, StreamStatus::Completed)
    }

    /// Mark an active stream aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when the stream is already
    /// terminal, or a backend error. A missing stream is `Ok(None)`.
    pub fn abort(&self, id: &str) -> Result<Option<Stream>> {
        self.finish(id, StreamStatus::Aborted)
    }

    fn finish(&self, id: &str, to: StreamStatus) -> Result<Option<Stream>> {
        let patch = StreamPatch {
            status: Some(to),
            updated_at: Some(now_millis()),
            ..StreamPatch::default()
        };
        let updated = self.base.update(&[Condition::eq("id", id), active()], patch)?;
        if let Some(stream) = updated.into_iter().next() {
            return Ok(Some(stream));
        }

        match self.base.select_by_id(id)? {
            None => Ok(None),
            Some(current) => {
                warn!(stream_id = id, from = %current.status, to = %to, "Rejected stream transition");
                Err(Error::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to,
                })
            }
        }
    }

    /// Expire every active stream whose deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn expire_stale(&self) -> Result<usize> {
        self.expire_stale_at(now_millis())
    }

    /// [`Self::expire_stale`] with an explicit clock.
    ///
    /// Streams are selected first and then expired one update at a time,
    /// each conditional on still being active. The sweep is not atomic: an
    /// error part-way leaves earlier streams expired and later ones active
    /// for the next sweep. Returns how many streams this call transitioned.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn expire_stale_at(&self, now: i64) -> Result<usize> {
        let stale: Vec<Stream> = self
            .base
            .select(&[active()])?
            .into_iter()
            .filter(|s| s.is_stale_at(now))
            .collect();

        let mut expired = 0;
        for stream in &stale {
            let patch = StreamPatch {
                status: Some(StreamStatus::Expired),
                updated_at: Some(now),
                ..StreamPatch::default()
            };
            expired += self
                .base
                .update(&[Condition::eq("id", stream.id.as_str()), active()], patch)?
                .len();
        }

        if expired > 0 {
            info!(expired, "Expired stale streams");
        }
        Ok(expired)
    }

    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_by_resume_token(&self, resume_token: &str) -> Result<Option<Stream>> {
        Ok(self
            .base
            .select(&[Condition::eq("resume_token", resume_token)])?
            .into_iter()
            .next())
    }

    /// Whether a client may reconnect to this stream now.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn can_resume(&self, id: &str) -> Result<bool> {
        self.can_resume_at(id, now_millis())
    }

    /// Exists, is active, and `expires_at` is unset or not before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn can_resume_at(&self, id: &str, now: i64) -> Result<bool> {
        Ok(self
            .base
            .select_by_id(id)?
            .is_some_and(|s| s.is_resumable_at(now)))
    }
}
