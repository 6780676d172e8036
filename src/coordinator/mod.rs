//! List-state coordinator.
//!
//! Keeps an in-memory mirror of every stored item and routes user actions to
//! the repository. The store stays the source of truth: the mirror is
//! reloaded after inserts and patched in place only after a single-row write
//! has succeeded.

pub mod import;
pub mod notice;
pub mod view;

pub use import::{ImportOutcome, IMPORTED_CATEGORY, PLACEHOLDER_NAME};
pub use notice::{Notice, NoticeLevel};
pub use view::{filter_by_name, ListStats};

use crate::datasource::ListSource;
use crate::db::Repository;
use crate::domain::{GroceryDraft, GroceryItem, ItemId};
use crate::error::GroceryError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A delete waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDeletion {
    pub token: Uuid,
    pub id: ItemId,
    /// Name shown in the prompt; `None` when the id is not on the list.
    pub name: Option<String>,
}

impl PendingDeletion {
    pub fn prompt(&self) -> String {
        match &self.name {
            Some(name) => format!("Delete \"{}\" from the list?", name),
            None => format!("Delete item {} from the list?", self.id),
        }
    }
}

pub struct ListCoordinator {
    repo: Arc<Repository>,
    source: Arc<dyn ListSource>,
    items: Vec<GroceryItem>,
    pending_deletions: HashMap<Uuid, PendingDeletion>,
    notice: Option<Notice>,
}

impl ListCoordinator {
    /// Create a coordinator with an empty mirror; call [`load`](Self::load)
    /// to populate it.
    pub fn new(repo: Arc<Repository>, source: Arc<dyn ListSource>) -> Self {
        Self {
            repo,
            source,
            items: Vec::new(),
            pending_deletions: HashMap::new(),
            notice: None,
        }
    }

    /// Every mirrored item in store order.
    pub fn items(&self) -> &[GroceryItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&GroceryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Mirrored items whose name matches `query`.
    pub fn search(&self, query: &str) -> Vec<&GroceryItem> {
        filter_by_name(&self.items, query)
    }

    pub fn stats(&self) -> ListStats {
        ListStats::of(&self.items)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismiss the current notice, returning it.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Replace the mirror with the stored rows.
    ///
    /// On failure the previous mirror is kept and an error notice recorded.
    pub async fn load(&mut self) -> Result<usize, GroceryError> {
        self.notice = None;
        let items = self
            .repo
            .get_all()
            .await
            .map_err(|e| self.fail(GroceryError::Storage(e)))?;

        self.items = items;
        info!(count = self.items.len(), "Loaded grocery list");
        Ok(self.items.len())
    }

    /// Flip `bought` for `id`, persisting before touching the mirror.
    pub async fn toggle_bought(&mut self, id: ItemId) -> Result<GroceryItem, GroceryError> {
        self.notice = None;
        let toggled = self.get(id).map(GroceryItem::toggled);
        let Some(toggled) = toggled else {
            return Err(self.fail(GroceryError::NotFound(id)));
        };

        let updated = self
            .repo
            .update(&toggled)
            .await
            .map_err(|e| self.fail(GroceryError::Storage(e)))?;
        if !updated {
            warn!(id = %id, "Toggle matched no stored row");
            return Err(self.fail(GroceryError::NotFound(id)));
        }

        self.patch(toggled.clone());
        Ok(toggled)
    }

    /// Validate and insert a new item, then reload so it carries its
    /// store-assigned id.
    pub async fn add(&mut self, draft: GroceryDraft) -> Result<ItemId, GroceryError> {
        self.notice = None;
        let draft = draft.normalized();
        if let Err(err) = validate_name(&draft.name) {
            return Err(self.fail(err));
        }

        let id = self
            .repo
            .create(&draft)
            .await
            .map_err(|e| self.fail(GroceryError::Storage(e)))?;
        self.load().await?;

        info!(id = %id, name = %draft.name, "Added grocery item");
        self.notice = Some(Notice::success(format!("Added \"{}\" to the list", draft.name)));
        Ok(id)
    }

    /// Overwrite an existing item's editable fields.
    ///
    /// `created_at` is immutable; the mirror keeps the stored value.
    pub async fn edit(&mut self, item: GroceryItem) -> Result<GroceryItem, GroceryError> {
        self.notice = None;
        let mut item = item;
        item.name = item.name.trim().to_string();
        item.category = item.category.trim().to_string();
        if let Err(err) = validate_name(&item.name) {
            return Err(self.fail(err));
        }

        let updated = self
            .repo
            .update(&item)
            .await
            .map_err(|e| self.fail(GroceryError::Storage(e)))?;
        if !updated {
            return Err(self.fail(GroceryError::NotFound(item.id)));
        }

        let id = item.id;
        let mirrored_created_at = self.get(id).map(|current| current.created_at);
        match mirrored_created_at {
            Some(created_at) => self.patch(GroceryItem { created_at, ..item }),
            // Stored but not mirrored: the mirror is stale.
            None => {
                self.load().await?;
            }
        }

        let stored = self.get(id).cloned().ok_or(GroceryError::NotFound(id))?;
        self.notice = Some(Notice::success(format!("Updated \"{}\"", stored.name)));
        Ok(stored)
    }

    /// First phase of a delete: issue a confirmation token. Nothing is
    /// written until [`confirm_delete`](Self::confirm_delete).
    ///
    /// At most one token is pending per id; a new request expires the
    /// previous one.
    pub fn request_delete(&mut self, id: ItemId) -> PendingDeletion {
        self.notice = None;
        self.pending_deletions.retain(|_, pending| pending.id != id);
        let pending = PendingDeletion {
            token: Uuid::new_v4(),
            id,
            name: self.get(id).map(|item| item.name.clone()),
        };
        self.pending_deletions.insert(pending.token, pending.clone());
        pending
    }

    /// Number of deletes waiting for confirmation.
    pub fn pending_deletions(&self) -> usize {
        self.pending_deletions.len()
    }

    /// Drop a pending delete. Returns whether the token was pending.
    pub fn cancel_delete(&mut self, token: Uuid) -> bool {
        self.pending_deletions.remove(&token).is_some()
    }

    /// Second phase of a delete: remove the row and its mirror entry.
    ///
    /// Returns `false` when no stored row had the id. The token is consumed
    /// unless the store fails, in which case it can be confirmed again.
    pub async fn confirm_delete(&mut self, token: Uuid) -> Result<bool, GroceryError> {
        self.notice = None;
        let Some(pending) = self.pending_deletions.remove(&token) else {
            return Err(self.fail(GroceryError::UnknownToken(token.to_string())));
        };

        let removed = match self.repo.delete(pending.id).await {
            Ok(removed) => removed,
            Err(e) => {
                self.pending_deletions.insert(token, pending);
                return Err(self.fail(GroceryError::Storage(e)));
            }
        };

        self.items.retain(|item| item.id != pending.id);
        self.notice = Some(if removed {
            info!(id = %pending.id, "Deleted grocery item");
            Notice::success("Item removed from the list")
        } else {
            Notice::info("Item was already gone")
        });
        Ok(removed)
    }

    /// Fetch the remote list and insert every record whose name is new.
    ///
    /// Inserts run one at a time. If one fails, rows already inserted stay
    /// in the store and the mirror is reloaded to show them. A failed reload
    /// after a complete import still reports the outcome.
    pub async fn import_from_remote(&mut self) -> Result<ImportOutcome, GroceryError> {
        self.notice = None;
        let records = self
            .source
            .fetch_list()
            .await
            .map_err(|e| self.fail(GroceryError::Network(e)))?;

        let drafts = records.iter().map(import::draft_from_record).collect();
        let fresh = import::select_new(drafts, &self.items);
        let fetched = records.len();
        let attempted = fresh.len();

        if fresh.is_empty() {
            info!(fetched, "Import found nothing new");
            self.notice = Some(Notice::info(
                "Nothing new to import: every item is already on the list",
            ));
            return Ok(ImportOutcome {
                fetched,
                inserted: 0,
                skipped: fetched,
            });
        }

        for (inserted, draft) in fresh.iter().enumerate() {
            if let Err(source) = self.repo.create(draft).await {
                warn!(inserted, attempted, error = %source, "Import insert failed");
                if let Err(reload_err) = self.load().await {
                    warn!(error = %reload_err, "Reload after failed import failed");
                }
                return Err(self.fail(GroceryError::PartialImport {
                    inserted,
                    attempted,
                    source,
                }));
            }
        }

        info!(fetched, inserted = attempted, "Imported remote list");
        let notice = match self.load().await {
            Ok(_) => Notice::success(format!("Imported {} new item(s)", attempted)),
            Err(reload_err) => {
                warn!(error = %reload_err, "Reload after import failed");
                Notice::info(format!(
                    "Imported {} new item(s); refresh to see them",
                    attempted
                ))
            }
        };
        self.notice = Some(notice);
        Ok(ImportOutcome {
            fetched,
            inserted: attempted,
            skipped: fetched - attempted,
        })
    }

    fn patch(&mut self, item: GroceryItem) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item;
        }
    }

    fn fail(&mut self, err: GroceryError) -> GroceryError {
        warn!(error = %err, "Grocery list operation failed");
        self.notice = Some(Notice::error(err.to_string()));
        err
    }
}

fn validate_name(name: &str) -> Result<(), GroceryError> {
    if name.trim().is_empty() {
        return Err(GroceryError::Validation(
            "Item name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DataSourceError, MockListSource};
    use crate::db::init_db;
    use crate::domain::default_samples;
    use serde_json::json;
    use sqlx::SqlitePool;

    async fn setup(source: MockListSource) -> (ListCoordinator, SqlitePool) {
        let pool = init_db(":memory:").await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool.clone()));
        repo.seed_if_empty(&default_samples()).await.unwrap();
        let mut coordinator = ListCoordinator::new(repo, Arc::new(source));
        coordinator.load().await.unwrap();
        (coordinator, pool)
    }

    async fn break_table(pool: &SqlitePool) {
        sqlx::query("DROP TABLE grocery_items")
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_populates_mirror() {
        let (coordinator, _pool) = setup(MockListSource::new()).await;
        assert_eq!(coordinator.items().len(), 3);
        assert_eq!(coordinator.stats(), ListStats { total: 3, bought: 0 });
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_mirror() {
        let (mut coordinator, pool) = setup(MockListSource::new()).await;
        break_table(&pool).await;

        let err = coordinator.load().await.unwrap_err();
        assert!(matches!(err, GroceryError::Storage(_)));
        assert_eq!(coordinator.items().len(), 3);
        assert_eq!(coordinator.notice().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_add_reloads_with_store_id() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let id = coordinator
            .add(GroceryDraft::new("  Coffee ", 2, "Drinks"))
            .await
            .unwrap();

        assert_eq!(id, ItemId::new(4));
        let added = coordinator.get(id).unwrap();
        assert_eq!(added.name, "Coffee");
        assert_eq!(added.quantity, 2);
        assert_eq!(added.category, "Drinks");
        assert_eq!(coordinator.items().len(), 4);
        assert_eq!(coordinator.notice().unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_name_before_store() {
        let (mut coordinator, pool) = setup(MockListSource::new()).await;
        let err = coordinator
            .add(GroceryDraft::new("   ", 1, ""))
            .await
            .unwrap_err();

        assert!(matches!(err, GroceryError::Validation(_)));
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM grocery_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 3);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let id = ItemId::new(2);

        let first = coordinator.toggle_bought(id).await.unwrap();
        assert!(first.bought);
        assert!(coordinator.get(id).unwrap().bought);

        let second = coordinator.toggle_bought(id).await.unwrap();
        assert!(!second.bought);
        assert!(!coordinator.get(id).unwrap().bought);
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        coordinator.toggle_bought(ItemId::new(1)).await.unwrap();
        coordinator.load().await.unwrap();
        assert!(coordinator.get(ItemId::new(1)).unwrap().bought);
    }

    #[tokio::test]
    async fn test_toggle_failure_leaves_mirror() {
        let (mut coordinator, pool) = setup(MockListSource::new()).await;
        break_table(&pool).await;

        let err = coordinator.toggle_bought(ItemId::new(1)).await.unwrap_err();
        assert!(matches!(err, GroceryError::Storage(_)));
        assert!(!coordinator.get(ItemId::new(1)).unwrap().bought);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let err = coordinator.toggle_bought(ItemId::new(99)).await.unwrap_err();
        assert!(matches!(err, GroceryError::NotFound(id) if id == ItemId::new(99)));
    }

    #[tokio::test]
    async fn test_edit_replaces_entry_and_keeps_created_at() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let original = coordinator.get(ItemId::new(3)).unwrap().clone();

        let mut changed = original.clone();
        changed.name = " Baguette ".to_string();
        changed.quantity = 4;
        changed.created_at = chrono::Utc::now() + chrono::Duration::days(1);

        let stored = coordinator.edit(changed).await.unwrap();
        assert_eq!(stored.name, "Baguette");
        assert_eq!(stored.quantity, 4);
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(coordinator.get(ItemId::new(3)).unwrap(), &stored);
    }

    #[tokio::test]
    async fn test_edit_validation_and_missing_row() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let mut item = coordinator.get(ItemId::new(1)).unwrap().clone();

        item.name = String::new();
        let err = coordinator.edit(item.clone()).await.unwrap_err();
        assert!(matches!(err, GroceryError::Validation(_)));
        assert_eq!(coordinator.get(ItemId::new(1)).unwrap().name, "Sữa");

        item.name = "Ghost".to_string();
        item.id = ItemId::new(50);
        let err = coordinator.edit(item).await.unwrap_err();
        assert!(matches!(err, GroceryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let pending = coordinator.request_delete(ItemId::new(2));
        assert_eq!(pending.name.as_deref(), Some("Trứng"));
        assert_eq!(pending.prompt(), "Delete \"Trứng\" from the list?");
        assert_eq!(coordinator.items().len(), 3);

        assert!(coordinator.confirm_delete(pending.token).await.unwrap());
        assert_eq!(coordinator.items().len(), 2);
        assert!(coordinator.get(ItemId::new(2)).is_none());

        let err = coordinator.confirm_delete(pending.token).await.unwrap_err();
        assert!(matches!(err, GroceryError::UnknownToken(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let pending = coordinator.request_delete(ItemId::new(77));
        assert!(pending.name.is_none());

        assert!(!coordinator.confirm_delete(pending.token).await.unwrap());
        assert_eq!(coordinator.items().len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_delete() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let pending = coordinator.request_delete(ItemId::new(1));
        assert!(coordinator.cancel_delete(pending.token));
        assert!(!coordinator.cancel_delete(pending.token));
        assert!(coordinator.confirm_delete(pending.token).await.is_err());
        assert_eq!(coordinator.items().len(), 3);
    }

    #[tokio::test]
    async fn test_import_inserts_new_items() {
        let source = MockListSource::new().with_records(vec![
            json!({"name": "Rice", "quantity": 2, "completed": true}),
            json!({"name": "sữa ", "quantity": 1}),
            json!({"quantity": "abc"}),
        ]);
        let (mut coordinator, _pool) = setup(source).await;

        let outcome = coordinator.import_from_remote().await.unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                fetched: 3,
                inserted: 2,
                skipped: 1
            }
        );
        assert_eq!(coordinator.items().len(), 5);

        let found = coordinator.search("rice");
        let rice = found[0];
        assert!(rice.bought);
        assert_eq!(rice.quantity, 2);
        assert_eq!(rice.category, IMPORTED_CATEGORY);
        assert_eq!(coordinator.search(PLACEHOLDER_NAME).len(), 1);
    }

    #[tokio::test]
    async fn test_import_all_duplicates_is_noop() {
        let source = MockListSource::new().with_records(vec![
            json!({"name": "Sữa"}),
            json!({"name": "TRỨNG"}),
        ]);
        let (mut coordinator, _pool) = setup(source).await;

        let outcome = coordinator.import_from_remote().await.unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(coordinator.items().len(), 3);
        assert_eq!(coordinator.notice().unwrap().level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn test_import_network_error_changes_nothing() {
        let source = MockListSource::new().with_error(DataSourceError::HttpError {
            status: 503,
            message: "Server error".to_string(),
        });
        let (mut coordinator, _pool) = setup(source).await;

        let err = coordinator.import_from_remote().await.unwrap_err();
        assert!(matches!(err, GroceryError::Network(_)));
        assert_eq!(coordinator.items().len(), 3);
        assert!(coordinator
            .notice()
            .unwrap()
            .message
            .contains("HTTP error 503"));
    }

    #[tokio::test]
    async fn test_import_partial_failure_keeps_earlier_rows() {
        let source = MockListSource::new().with_records(vec![
            json!({"name": "Rice"}),
            json!({"name": "Poison"}),
            json!({"name": "Beans"}),
        ]);
        let (mut coordinator, pool) = setup(source).await;
        sqlx::query(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON grocery_items \
             WHEN NEW.name = 'Poison' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = coordinator.import_from_remote().await.unwrap_err();
        match err {
            GroceryError::PartialImport {
                inserted,
                attempted,
                ..
            } => {
                assert_eq!(inserted, 1);
                assert_eq!(attempted, 3);
            }
            other => panic!("Expected PartialImport, got {:?}", other),
        }
        assert_eq!(coordinator.items().len(), 4);
        assert_eq!(coordinator.search("rice").len(), 1);
        assert!(coordinator.search("beans").is_empty());
    }

    #[tokio::test]
    async fn test_import_reports_outcome_when_reload_fails() {
        let source = MockListSource::new().with_records(vec![json!({"name": "Odd"})]);
        let (mut coordinator, pool) = setup(source).await;
        sqlx::query(
            "CREATE TRIGGER mangle_odd AFTER INSERT ON grocery_items \
             WHEN NEW.name = 'Odd' BEGIN \
             UPDATE grocery_items SET quantity = 'many' WHERE id = NEW.id; END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let outcome = coordinator.import_from_remote().await.unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(coordinator.items().len(), 3);
        assert_eq!(coordinator.notice().unwrap().level, NoticeLevel::Info);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM grocery_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 4);
    }

    #[tokio::test]
    async fn test_failed_operation_notice_does_not_leak_into_next() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        coordinator.toggle_bought(ItemId::new(42)).await.unwrap_err();
        assert_eq!(coordinator.notice().unwrap().level, NoticeLevel::Error);

        coordinator.toggle_bought(ItemId::new(2)).await.unwrap();
        assert!(coordinator.notice().is_none());

        coordinator.toggle_bought(ItemId::new(42)).await.unwrap_err();
        coordinator.load().await.unwrap();
        assert!(coordinator.notice().is_none());
    }

    #[tokio::test]
    async fn test_request_delete_replaces_pending_token_for_same_id() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        let first = coordinator.request_delete(ItemId::new(1));
        let second = coordinator.request_delete(ItemId::new(1));
        coordinator.request_delete(ItemId::new(2));
        assert_ne!(first.token, second.token);
        assert_eq!(coordinator.pending_deletions(), 2);

        let err = coordinator.confirm_delete(first.token).await.unwrap_err();
        assert!(matches!(err, GroceryError::UnknownToken(_)));
        assert!(coordinator.confirm_delete(second.token).await.unwrap());
        assert_eq!(coordinator.pending_deletions(), 1);
    }

    #[tokio::test]
    async fn test_take_notice_dismisses() {
        let (mut coordinator, _pool) = setup(MockListSource::new()).await;
        coordinator
            .add(GroceryDraft::new("Tea", 1, ""))
            .await
            .unwrap();
        assert!(coordinator.take_notice().is_some());
        assert!(coordinator.notice().is_none());
    }
}
