//! In-memory item store for tests

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ItemStore;
use crate::models::{
    Item, ItemChanges, ItemQuery, ItemSummary, NewItem, NewRecoveredItem, RecoveredItem,
    RecoveredItemWithItem,
};

#[derive(Default)]
struct Tables {
    // (insertion sequence, row); the sequence breaks created_at ties
    items: Vec<(u64, Item)>,
    recoveries: Vec<(u64, RecoveredItem)>,
    next_seq: u64,
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Item store holding its rows in process memory
#[derive(Default)]
pub struct InMemoryItemStore {
    tables: RwLock<Tables>,
    unavailable: std::sync::atomic::AtomicBool,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_available(&self) -> DatabaseResult<()> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DatabaseError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert_item(&self, item: &NewItem) -> DatabaseResult<Item> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Item {
            id: Uuid::new_v4(),
            title: item.title.clone(),
            description: item.description.clone(),
            post_type: item.post_type,
            category: item.category,
            location: item.location.clone(),
            date_lost_found: item.date_lost_found,
            thumbnail_url: item.thumbnail_url.clone(),
            contact_name: item.contact_name.clone(),
            contact_email: item.contact_email.clone(),
            is_recovered: false,
            user_id: item.user_id,
            created_at: now,
            updated_at: now,
        };
        let seq = tables.seq();
        tables.items.push((seq, row.clone()));
        Ok(row)
    }

    async fn find_item(&self, id: Uuid) -> DatabaseResult<Option<Item>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .find(|(_, item)| item.id == id)
            .map(|(_, item)| item.clone()))
    }

    async fn list_items(&self, query: &ItemQuery) -> DatabaseResult<Vec<Item>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&(u64, Item)> = tables
            .items
            .iter()
            .filter(|(_, item)| query.matches(item))
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(0));
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn update_item(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &ItemChanges,
    ) -> DatabaseResult<Option<Item>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let Some((_, item)) = tables
            .items
            .iter_mut()
            .find(|(_, item)| item.id == id && item.user_id == owner)
        else {
            return Ok(None);
        };

        changes.apply_to(item);
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: Uuid, owner: Uuid) -> DatabaseResult<bool> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.items.len();
        tables
            .items
            .retain(|(_, item)| !(item.id == id && item.user_id == owner));
        let deleted = tables.items.len() < before;
        if deleted {
            tables.recoveries.retain(|(_, recovery)| recovery.item_id != id);
        }
        Ok(deleted)
    }

    async fn insert_recovery(&self, recovery: &NewRecoveredItem) -> DatabaseResult<RecoveredItem> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.items.iter().any(|(_, item)| item.id == recovery.item_id) {
            return Err(DatabaseError::Query(sqlx::Error::RowNotFound));
        }

        let row = RecoveredItem {
            id: Uuid::new_v4(),
            item_id: recovery.item_id,
            recovered_by_user_id: recovery.recovered_by_user_id,
            recovered_person_name: recovery.recovered_person_name.clone(),
            recovered_person_email: recovery.recovered_person_email.clone(),
            recovered_person_image: recovery.recovered_person_image.clone(),
            recovery_date: recovery.recovery_date,
            recovered_location: recovery.recovered_location.clone(),
            created_at: Utc::now(),
        };
        let seq = tables.seq();
        tables.recoveries.push((seq, row.clone()));
        Ok(row)
    }

    async fn list_recoveries(&self) -> DatabaseResult<Vec<RecoveredItemWithItem>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<(u64, RecoveredItemWithItem)> = tables
            .recoveries
            .iter()
            .filter_map(|(seq, recovery)| {
                let (_, item) = tables
                    .items
                    .iter()
                    .find(|(_, item)| item.id == recovery.item_id)?;
                Some((
                    *seq,
                    RecoveredItemWithItem {
                        recovery: recovery.clone(),
                        item: ItemSummary {
                            title: item.title.clone(),
                            description: item.description.clone(),
                            post_type: item.post_type,
                            category: item.category,
                            location: item.location.clone(),
                            date_lost_found: item.date_lost_found,
                        },
                    },
                ))
            })
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.recovery
                .created_at
                .cmp(&a.recovery.created_at)
                .then(b_seq.cmp(a_seq))
        });

        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }
}
