//! Repositories for database operations
//!
//! [`ItemStore`] is the query client the item service talks to. Every
//! listing is ordered by `created_at` descending; writes on items carry the
//! owner as part of their predicate so a mismatched owner touches no rows.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{
    Item, ItemChanges, ItemQuery, NewItem, NewRecoveredItem, RecoveredItem, RecoveredItemWithItem,
};

pub mod item;
#[cfg(test)]
pub mod memory;

pub use item::PgItemStore;

/// Table operations over `items` and `recovered_items`
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert an item; `is_recovered` is always stored as false
    async fn insert_item(&self, item: &NewItem) -> DatabaseResult<Item>;

    /// Find an item by id
    async fn find_item(&self, id: Uuid) -> DatabaseResult<Option<Item>>;

    /// List items matching `query`, newest first
    async fn list_items(&self, query: &ItemQuery) -> DatabaseResult<Vec<Item>>;

    /// Update the row matching both `id` and `owner`; `None` when no row matched
    async fn update_item(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &ItemChanges,
    ) -> DatabaseResult<Option<Item>>;

    /// Delete the row matching both `id` and `owner`; false when no row matched
    async fn delete_item(&self, id: Uuid, owner: Uuid) -> DatabaseResult<bool>;

    /// Insert a recovery record
    async fn insert_recovery(&self, recovery: &NewRecoveredItem) -> DatabaseResult<RecoveredItem>;

    /// List recoveries joined with their parent item, newest first
    async fn list_recoveries(&self) -> DatabaseResult<Vec<RecoveredItemWithItem>>;
}
