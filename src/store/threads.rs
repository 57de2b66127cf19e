//! Thread containers and scope lookups.

use crate::error::Result;
use crate::model::{NewThread, Thread, ThreadPatch, ThreadUpdate, now_millis};
use crate::storage::backend::{Backend, Condition};
use crate::store::factory::{ModelFactory, take_first};
use std::ops::Deref;
use tracing::debug;

/// Thread operations. Derefs to the generic [`ModelFactory`].
#[derive(Debug)]
pub struct ThreadsModel<'db, B: Backend + ?Sized> {
    base: ModelFactory<'db, Thread, B>,
}

impl<'db, B: Backend + ?Sized> Deref for ThreadsModel<'db, B> {
    type Target = ModelFactory<'db, Thread, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<'db, B: Backend + ?Sized> ThreadsModel<'db, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            base: ModelFactory::new(backend),
        }
    }

    /// Threads attached to one owner record.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn find_by_scope(&self, project_id: &str, scope_type: &str, scope_id: &str) -> Result<Vec<Thread>> {
        self.base.select(&[
            Condition::eq("project_id", project_id),
            Condition::eq("scope_type", scope_type),
            Condition::eq("scope_id", scope_id),
        ])
    }

    /// Return the thread for a scope, creating it if none exists.
    ///
    /// On a hit the first match is returned and `title` is ignored.
    ///
    /// This is a read followed by a write with nothing in between, so two
    /// concurrent callers can both miss and both insert. Callers that need
    /// one thread per scope must serialize calls themselves.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank ids, or a backend error.
    pub fn get_or_create(
        &self,
        project_id: &str,
        scope_type: &str,
        scope_id: &str,
        title: Option<&str>,
    ) -> Result<Thread> {
        if let Some(existing) = self.find_by_scope(project_id, scope_type, scope_id)?.into_iter().next() {
            debug!(thread_id = %existing.id, "Reusing thread for scope");
            return Ok(existing);
        }

        let mut new = NewThread::new(project_id).scope(scope_type, scope_id);
        new.title = title.map(str::to_string);
        take_first(self.base.insert(vec![new])?, "thread")
    }

    /// All threads in a project, unordered.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_by_project(&self, project_id: &str) -> Result<Vec<Thread>> {
        self.base.select(&[Condition::eq("project_id", project_id)])
    }

    /// Change title and/or metadata, stamping `updated_at`.
    /// Returns `None` when no thread has this id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-object metadata, or a backend error.
    pub fn update_thread(&self, id: &str, update: ThreadUpdate) -> Result<Option<Thread>> {
        let patch = ThreadPatch {
            title: update.title,
            metadata: update.metadata,
            updated_at: Some(now_millis()),
            ..ThreadPatch::default()
        };
        Ok(self.base.update(&[Condition::eq("id", id)], patch)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::SqliteBackend;
    use serde_json::json;

    #[test]
    fn test_find_by_scope() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);
        threads
            .insert(vec![
                NewThread::new("p1").scope("ticket", "T-1"),
                NewThread::new("p1").scope("ticket", "T-2"),
                NewThread::new("p2").scope("ticket", "T-1"),
            ])
            .unwrap();

        let found = threads.find_by_scope("p1", "ticket", "T-1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].scope_id.as_deref(), Some("T-1"));
        assert!(threads.find_by_scope("p1", "order", "T-1").unwrap().is_empty());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);

        let first = threads
            .get_or_create("p1", "ticket", "T-101", Some("Support"))
            .unwrap();
        let second = threads
            .get_or_create("p1", "ticket", "T-101", Some("Ignored"))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title.as_deref(), Some("Support"));
        assert_eq!(threads.list_by_project("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_create_returns_inserted_thread_unchanged() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);
        let seeded = take_first(
            threads
                .insert(vec![NewThread::new("p1").scope("ticket", "T-1")])
                .unwrap(),
            "thread",
        )
        .unwrap();

        let found = threads.get_or_create("p1", "ticket", "T-1", Some("X")).unwrap();
        assert_eq!(found, seeded);
        assert!(found.title.is_none());
        assert_eq!(threads.list_by_project("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_create_rejects_blank_project() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);
        let err = threads.get_or_create("", "ticket", "T-1", None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_update_thread_stamps_updated_at() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);
        let created = take_first(threads.insert(vec![NewThread::new("p1")]).unwrap(), "thread").unwrap();

        let updated = threads
            .update_thread(
                &created.id,
                ThreadUpdate {
                    title: Some("Renamed".to_string()),
                    metadata: Some(json!({"priority": "high"})),
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("Renamed"));
        assert_eq!(updated.metadata, Some(json!({"priority": "high"})));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let missing = threads
            .update_thread("nope", ThreadUpdate::default())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_update_thread_rejects_scalar_metadata() {
        let backend = SqliteBackend::open_memory().unwrap();
        let threads = ThreadsModel::new(&backend);
        let err = threads
            .update_thread(
                "any",
                ThreadUpdate {
                    title: None,
                    metadata: Some(json!("flat")),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
