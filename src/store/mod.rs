//! Typed models over a [`Backend`].
//!
//! [`ModelFactory`] supplies generic CRUD; the per-entity models add the
//! queries each record type needs. [`ThreadModels`] binds all four to one
//! backend handle.
//!
//! ```no_run
//! use threads::model::{NewItem, Role};
//! use threads::storage::SqliteBackend;
//! use threads::store::ThreadModels;
//!
//! # fn main() -> threads::Result<()> {
//! let backend = SqliteBackend::open_memory()?;
//! let models = ThreadModels::new(&backend);
//!
//! let thread = models.threads.get_or_create("proj_123", "ticket", "T-101", Some("Support"))?;
//! models.items.append(NewItem::text(&thread.id, Role::User, "Hello", "req_1"))?;
//!
//! let full = models.get_thread_with_items(&thread.id)?;
//! # Ok(())
//! # }
//! ```

pub mod edges;
pub mod factory;
pub mod items;
pub mod streams;
pub mod threads;

pub use edges::EdgesModel;
pub use factory::{Entity, ModelFactory, take_first};
pub use items::{ItemsModel, SortOrder};
pub use streams::{DEFAULT_STREAM_TTL_MS, StreamsModel};
pub use threads::ThreadsModel;

use crate::error::Result;
use crate::model::ThreadWithItems;
use crate::storage::Backend;

/// All four models bound to one backend.
#[derive(Debug)]
pub struct ThreadModels<'db, B: Backend + ?Sized> {
    pub threads: ThreadsModel<'db, B>,
    pub items: ItemsModel<'db, B>,
    pub edges: EdgesModel<'db, B>,
    pub streams: StreamsModel<'db, B>,
}

impl<'db, B: Backend + ?Sized> ThreadModels<'db, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            threads: ThreadsModel::new(backend),
            items: ItemsModel::new(backend),
            edges: EdgesModel::new(backend),
            streams: StreamsModel::new(backend),
        }
    }

    /// A thread with every item, oldest first. `None` if the thread does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_thread_with_items(&self, thread_id: &str) -> Result<Option<ThreadWithItems>> {
        let Some(thread) = self.threads.select_by_id(thread_id)? else {
            return Ok(None);
        };
        let items = self.items.list_by_thread(thread_id, SortOrder::Asc)?;
        Ok(Some(ThreadWithItems { thread, items }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewItem, Role, Visibility};
    use crate::storage::SqliteBackend;
    use serde_json::json;

    #[test]
    fn test_thread_with_items() {
        let backend = SqliteBackend::open_memory().unwrap();
        let models = ThreadModels::new(&backend);

        let thread = models
            .threads
            .get_or_create("p1", "ticket", "T-1", Some("Support"))
            .unwrap();
        let first = models
            .items
            .append(NewItem::text(&thread.id, Role::User, "hello", "r1"))
            .unwrap();
        let second = models
            .items
            .append(NewItem::text(&thread.id, Role::Assistant, "hi", "r1").visibility(Visibility::Hidden))
            .unwrap();

        let full = models.get_thread_with_items(&thread.id).unwrap().unwrap();
        assert_eq!(full.thread, thread);
        assert_eq!(full.items, vec![first, second]);

        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(value["title"], json!("Support"));
        assert_eq!(value["items"].as_array().unwrap().len(), 2);

        assert!(models.get_thread_with_items("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_thread_cascades() {
        let backend = SqliteBackend::open_memory().unwrap();
        let models = ThreadModels::new(&backend);

        let thread = models.threads.get_or_create("p1", "ticket", "T-1", None).unwrap();
        let a = models
            .items
            .append(NewItem::text(&thread.id, Role::User, "a", "r"))
            .unwrap();
        let b = models
            .items
            .append(NewItem::text(&thread.id, Role::User, "b", "r"))
            .unwrap();
        models
            .edges
            .add_dependency(&thread.id, &a.id, &b.id, "r", crate::model::EdgeType::DependsOn)
            .unwrap();
        models.streams.start(&thread.id, None, None).unwrap();

        models
            .threads
            .delete(&[crate::storage::Condition::eq("id", thread.id.as_str())])
            .unwrap();

        assert_eq!(models.items.count(&thread.id).unwrap(), 0);
        assert!(models.edges.list_by_thread(&thread.id).unwrap().is_empty());
        assert!(models.streams.get_active(&thread.id).unwrap().is_none());
    }
}
