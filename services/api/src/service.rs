//! Item data-access operations
//!
//! [`ItemService`] validates payloads, checks ownership and turns store
//! results into [`ItemResult`]s. The caller's identity is always passed in
//! explicitly; nothing here reads ambient state.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ItemError, ItemResult},
    models::{
        Item, ItemChanges, ItemDraft, ItemPatch, ItemQuery, ItemState, RecoveredItem,
        RecoveredItemWithItem, RecoveryDraft,
    },
    repositories::ItemStore,
    validation,
};

/// The date already reached in the easternmost time zone (UTC+14)
///
/// Dates are checked against this, so a poster's local "today" is never
/// rejected as being in the future.
fn latest_local_date(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(14)).date_naive()
}

/// Item operations on top of an [`ItemStore`]
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        latest_local_date(Utc::now())
    }

    /// Items not yet recovered, newest first
    pub async fn list_active_items(&self) -> ItemResult<Vec<Item>> {
        let query = ItemQuery {
            is_recovered: Some(false),
            ..ItemQuery::default()
        };
        Ok(self.store.list_items(&query).await?)
    }

    /// The `limit` newest items regardless of recovery state
    pub async fn list_recent_items(&self, limit: u32) -> ItemResult<Vec<Item>> {
        let query = ItemQuery {
            limit: Some(i64::from(limit)),
            ..ItemQuery::default()
        };
        Ok(self.store.list_items(&query).await?)
    }

    pub async fn get_item_by_id(&self, id: Uuid) -> ItemResult<Item> {
        self.store.find_item(id).await?.ok_or(ItemError::NotFound)
    }

    /// Items posted by `user_id`, newest first
    pub async fn list_items_by_owner(&self, user_id: Uuid) -> ItemResult<Vec<Item>> {
        let query = ItemQuery {
            user_id: Some(user_id),
            ..ItemQuery::default()
        };
        Ok(self.store.list_items(&query).await?)
    }

    /// Validate and insert a new item owned by `owner`
    ///
    /// The stored item is always active, whatever the draft says.
    pub async fn create_item(&self, draft: &ItemDraft, owner: Uuid) -> ItemResult<Item> {
        let new_item = validation::validate_item_draft(draft, owner, Self::today())?;
        let item = self.store.insert_item(&new_item).await?;

        info!("Created item {} for user {}", item.id, owner);
        Ok(item)
    }

    /// Apply `patch` to an item owned by `owner`
    pub async fn update_item(&self, id: Uuid, owner: Uuid, patch: &ItemPatch) -> ItemResult<Item> {
        let changes = validation::validate_item_patch(patch, Self::today())?;
        self.ensure_owner(id, owner).await?;

        let item = self.write(id, owner, &changes).await?;
        info!("Updated item {} for user {}", id, owner);
        Ok(item)
    }

    /// Delete an item owned by `owner`
    pub async fn delete_item(&self, id: Uuid, owner: Uuid) -> ItemResult<()> {
        self.ensure_owner(id, owner).await?;

        if !self.store.delete_item(id, owner).await? {
            return Err(ItemError::NotFound);
        }

        info!("Deleted item {} for user {}", id, owner);
        Ok(())
    }

    /// Move an item owned by `owner` from Active to Recovered
    ///
    /// Marking an already recovered item returns it unchanged.
    pub async fn mark_recovered(&self, id: Uuid, owner: Uuid) -> ItemResult<Item> {
        let item = self.ensure_owner(id, owner).await?;
        if !item.state().can_transition_to(ItemState::Recovered) {
            return Ok(item);
        }

        let item = self.write(id, owner, &ItemChanges::recovered()).await?;
        info!("Marked item {} as recovered", id);
        Ok(item)
    }

    /// Log a reunification for an existing item
    ///
    /// This records the recovery only; the item's own `is_recovered` flag is
    /// changed through [`ItemService::mark_recovered`].
    pub async fn log_recovery(
        &self,
        item_id: Uuid,
        recovered_by: Uuid,
        draft: &RecoveryDraft,
    ) -> ItemResult<RecoveredItem> {
        let recovery =
            validation::validate_recovery_draft(draft, item_id, recovered_by, Self::today())?;
        self.get_item_by_id(item_id).await?;

        let recovered = self.store.insert_recovery(&recovery).await?;
        info!(
            "Logged recovery {} for item {} by user {}",
            recovered.id, item_id, recovered_by
        );
        Ok(recovered)
    }

    /// Recoveries with their parent item, newest first
    pub async fn list_recovered_items(&self) -> ItemResult<Vec<RecoveredItemWithItem>> {
        Ok(self.store.list_recoveries().await?)
    }

    async fn ensure_owner(&self, id: Uuid, owner: Uuid) -> ItemResult<Item> {
        let item = self.get_item_by_id(id).await?;
        if !item.is_owned_by(owner) {
            warn!("User {} attempted to modify item {} they do not own", owner, id);
            return Err(ItemError::Unauthorized);
        }
        Ok(item)
    }

    async fn write(&self, id: Uuid, owner: Uuid, changes: &ItemChanges) -> ItemResult<Item> {
        // The row may have vanished since the ownership check.
        self.store
            .update_item(id, owner, changes)
            .await?
            .ok_or(ItemError::NotFound)
    }
}
