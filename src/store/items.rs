//! The append-only item log.
//!
//! Listing helpers sort by id. Ids are UUIDv7, so id order is creation
//! order.

use crate::error::Result;
use crate::model::{Item, ItemPatch, NewItem, Visibility};
use crate::storage::backend::{Backend, Condition};
use crate::store::factory::{ModelFactory, take_first};
use std::ops::Deref;

/// Direction for [`ItemsModel::list_by_thread`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Item operations. Derefs to the generic [`ModelFactory`].
#[derive(Debug)]
pub struct ItemsModel<'db, B: Backend + ?Sized> {
    base: ModelFactory<'db, Item, B>,
}

impl<'db, B: Backend + ?Sized> Deref for ItemsModel<'db, B> {
    type Target = ModelFactory<'db, Item, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<'db, B: Backend + ?Sized> ItemsModel<'db, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            base: ModelFactory::new(backend),
        }
    }

    /// Every item in a thread, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_by_thread(&self, thread_id: &str, order: SortOrder) -> Result<Vec<Item>> {
        let mut items = self.base.select(&[Condition::eq("thread_id", thread_id)])?;
        match order {
            SortOrder::Asc => items.sort_by(|a, b| a.id.cmp(&b.id)),
            SortOrder::Desc => items.sort_by(|a, b| b.id.cmp(&a.id)),
        }
        Ok(items)
    }

    /// Items produced by one agent run.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_by_run(&self, thread_id: &str, run_id: &str) -> Result<Vec<Item>> {
        self.base.select(&[
            Condition::eq("thread_id", thread_id),
            Condition::eq("run_id", run_id),
        ])
    }

    /// Items grouped under one span.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_by_span(&self, thread_id: &str, span_id: &str) -> Result<Vec<Item>> {
        self.base.select(&[
            Condition::eq("thread_id", thread_id),
            Condition::eq("span_id", span_id),
        ])
    }

    /// Items a UI should render.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_visible(&self, thread_id: &str) -> Result<Vec<Item>> {
        self.list_where(thread_id, Visibility::is_displayed)
    }

    /// Items fed to a model: visible and hidden, never archived.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_for_context(&self, thread_id: &str) -> Result<Vec<Item>> {
        self.list_where(thread_id, Visibility::in_context)
    }

    fn list_where(&self, thread_id: &str, keep: impl Fn(&Visibility) -> bool) -> Result<Vec<Item>> {
        let mut items = self.list_by_thread(thread_id, SortOrder::Asc)?;
        items.retain(|item| keep(&item.visibility));
        Ok(items)
    }

    /// Insert one item.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad payload, or a backend error.
    pub fn append(&self, item: NewItem) -> Result<Item> {
        take_first(self.base.insert(vec![item])?, "item")
    }

    /// Change an item's visibility. `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn set_visibility(&self, id: &str, visibility: Visibility) -> Result<Option<Item>> {
        let patch = ItemPatch {
            visibility: Some(visibility),
        };
        Ok(self.base.update(&[Condition::eq("id", id)], patch)?.into_iter().next())
    }

    /// Soft delete: gone from both the UI and the model context.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn archive(&self, id: &str) -> Result<Option<Item>> {
        self.set_visibility(id, Visibility::Archived)
    }

    /// Hide from the UI but keep in the model context.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn hide(&self, id: &str) -> Result<Option<Item>> {
        self.set_visibility(id, Visibility::Hidden)
    }

    /// Make a hidden or archived item visible again.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn unhide(&self, id: &str) -> Result<Option<Item>> {
        self.set_visibility(id, Visibility::Visible)
    }

    /// Items whose `parent_id` is `parent_id`. Unordered, any thread.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_replies(&self, parent_id: &str) -> Result<Vec<Item>> {
        self.base.select(&[Condition::eq("parent_id", parent_id)])
    }

    /// The newest item in a thread, whatever its visibility.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_latest(&self, thread_id: &str) -> Result<Option<Item>> {
        Ok(self.list_by_thread(thread_id, SortOrder::Desc)?.into_iter().next())
    }

    /// Number of items in a thread, archived ones included.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn count(&self, thread_id: &str) -> Result<usize> {
        Ok(self.base.select(&[Condition::eq("thread_id", thread_id)])?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{MessagePart, NewThread, Role};
    use crate::storage::SqliteBackend;
    use crate::store::ThreadsModel;
    use crate::store::factory::tests::RecordingBackend;

    fn setup(backend: &SqliteBackend) -> String {
        let threads = ThreadsModel::new(backend);
        take_first(threads.insert(vec![NewThread::new("p1")]).unwrap(), "thread")
            .unwrap()
            .id
    }

    fn say(items: &ItemsModel<'_, SqliteBackend>, thread_id: &str, text: &str) -> Item {
        items
            .append(NewItem::text(thread_id, Role::User, text, "req-1"))
            .unwrap()
    }

    #[test]
    fn test_list_by_thread_preserves_call_order() {
        let backend = SqliteBackend::open_memory().unwrap();
        let thread_id = setup(&backend);
        let items = ItemsModel::new(&backend);

        let appended: Vec<String> = ["one", "two", "three", "four"]
            .iter()
            .map(|t| say(&items, &thread_id, t).id)
            .collect();

        let asc: Vec<String> = items
            .list_by_thread(&thread_id, SortOrder::Asc)
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(asc, appended);

        let mut desc: Vec<String> = items
            .list_by_thread(&thread_id, SortOrder::Desc)
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        desc.reverse();
        assert_eq!(desc, asc);
    }

    #[test]
    fn test_visibility_filters_nest() {
        let backend = SqliteBackend::open_memory().unwrap();
        let thread_id = setup(&backend);
        let items = ItemsModel::new(&backend);

        let a = say(&items, &thread_id, "a");
        let b = say(&items, &thread_id, "b");
        let c = say(&items, &thread_id, "c");
        items.hide(&b.id).unwrap();
        items.archive(&c.id).unwrap();

        let all = items.list_by_thread(&thread_id, SortOrder::Asc).unwrap();
        let context = items.list_for_context(&thread_id).unwrap();
        let visible = items.list_visible(&thread_id).unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(context.iter().map(|i| &i.id).collect::<Vec<_>>(), vec![&a.id, &b.id]);
        assert_eq!(visible.iter().map(|i| &i.id).collect::<Vec<_>>(), vec![&a.id]);
        assert!(visible.iter().all(|v| context.iter().any(|c| c.id == v.id)));
    }

    #[test]
    fn test_archive_removes_from_context_but_not_count() {
        let backend = SqliteBackend::open_memory().unwrap();
        let thread_id = setup(&backend);
        let items = ItemsModel::new(&backend);
        let item = say(&items, &thread_id, "gone");

        let archived = items.archive(&item.id).unwrap().unwrap();
        assert_eq!(archived.visibility, Visibility::Archived);
        assert!(items.list_visible(&thread_id).unwrap().is_empty());
        assert!(items.list_for_context(&thread_id).unwrap().is_empty());
        assert_eq!(items.count(&thread_id).unwrap(), 1);

        let restored = items.unhide(&item.id).unwrap().unwrap();
        assert_eq!(restored.visibility, Visibility::Visible);
        assert_eq!(items.list_visible(&thread_id).unwrap().len(), 1);
    }

    #[test]
    fn test_set_visibility_unknown_id() {
        let backend = SqliteBackend::open_memory().unwrap();
        let items = ItemsModel::new(&backend);
        assert!(items.hide("missing").unwrap().is_none());
    }

    #[test]
    fn test_runs_spans_and_replies() {
        let backend = SqliteBackend::open_memory().unwrap();
        let thread_id = setup(&backend);
        let items = ItemsModel::new(&backend);

        let question = say(&items, &thread_id, "question");
        let answer = items
            .append(
                NewItem::text(&thread_id, Role::Assistant, "answer", "req-2")
                    .run("run-1")
                    .span("span-a")
                    .reply_to(&question.id),
            )
            .unwrap();
        items
            .append(
                NewItem::new(
                    &thread_id,
                    Role::Tool,
                    vec![MessagePart::ToolResult {
                        tool_call_id: "call-1".to_string(),
                        result: serde_json::json!({"ok": true}),
                        is_error: None,
                    }],
                    "req-2",
                )
                .run("run-1")
                .span("span-b"),
            )
            .unwrap();

        assert_eq!(items.list_by_run(&thread_id, "run-1").unwrap().len(), 2);
        assert!(items.list_by_run(&thread_id, "run-2").unwrap().is_empty());
        assert_eq!(items.list_by_span(&thread_id, "span-a").unwrap().len(), 1);

        let replies = items.get_replies(&question.id).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, answer.id);
        assert_eq!(replies[0].text(), "answer");
    }

    #[test]
    fn test_latest_and_count() {
        let backend = SqliteBackend::open_memory().unwrap();
        let thread_id = setup(&backend);
        let items = ItemsModel::new(&backend);

        assert!(items.get_latest(&thread_id).unwrap().is_none());
        assert_eq!(items.count(&thread_id).unwrap(), 0);

        let n = 5;
        let mut last = None;
        for i in 0..n {
            last = Some(say(&items, &thread_id, &format!("msg {i}")));
        }

        assert_eq!(items.count(&thread_id).unwrap(), n);
        assert_eq!(items.get_latest(&thread_id).unwrap(), last);
    }

    #[test]
    fn test_append_validation_skips_backend() {
        let backend = RecordingBackend::new();
        let items = ItemsModel::new(&backend);
        let err = items
            .append(NewItem::text("t1", Role::User, "hi", ""))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { entity: "item", .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_append_to_missing_thread_is_database_error() {
        let backend = SqliteBackend::open_memory().unwrap();
        let items = ItemsModel::new(&backend);
        let err = items
            .append(NewItem::text("no-such-thread", Role::User, "hi", "r"))
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
