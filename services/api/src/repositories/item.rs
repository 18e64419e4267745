//! PostgreSQL adapter for the item store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::ItemStore;
use crate::models::{
    Category, Item, ItemChanges, ItemQuery, ItemSummary, NewItem, NewRecoveredItem, PostType,
    RecoveredItem, RecoveredItemWithItem,
};

const ITEM_COLUMNS: &str = "id, title, description, post_type, category, location, \
     date_lost_found, thumbnail_url, contact_name, contact_email, is_recovered, user_id, \
     created_at, updated_at";

/// Item store backed by PostgreSQL
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    /// Create a new item store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert_item(&self, item: &NewItem) -> DatabaseResult<Item> {
        let sql = format!(
            r#"
            INSERT INTO items (title, description, post_type, category, location,
                               date_lost_found, thumbnail_url, contact_name, contact_email,
                               is_recovered, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, Item>(&sql)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.post_type)
            .bind(item.category)
            .bind(&item.location)
            .bind(item.date_lost_found)
            .bind(&item.thumbnail_url)
            .bind(&item.contact_name)
            .bind(&item.contact_email)
            .bind(item.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_item(&self, id: Uuid) -> DatabaseResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");

        let row = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_items(&self, query: &ItemQuery) -> DatabaseResult<Vec<Item>> {
        // NULL parameters disable the corresponding predicate.
        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE ($1::BOOLEAN IS NULL OR is_recovered = $1)
              AND ($2::UUID IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        );

        let rows = sqlx::query_as::<_, Item>(&sql)
            .bind(query.is_recovered)
            .bind(query.user_id)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_item(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &ItemChanges,
    ) -> DatabaseResult<Option<Item>> {
        let sql = format!(
            r#"
            UPDATE items SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                post_type = COALESCE($5, post_type),
                category = COALESCE($6, category),
                location = COALESCE($7, location),
                date_lost_found = COALESCE($8, date_lost_found),
                thumbnail_url = COALESCE($9, thumbnail_url),
                contact_name = COALESCE($10, contact_name),
                contact_email = COALESCE($11, contact_email),
                is_recovered = is_recovered OR $12,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.post_type)
            .bind(changes.category)
            .bind(&changes.location)
            .bind(changes.date_lost_found)
            .bind(&changes.thumbnail_url)
            .bind(&changes.contact_name)
            .bind(&changes.contact_email)
            .bind(changes.mark_recovered)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn delete_item(&self, id: Uuid, owner: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM items
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_recovery(&self, recovery: &NewRecoveredItem) -> DatabaseResult<RecoveredItem> {
        let row = sqlx::query_as::<_, RecoveredItem>(
            r#"
            INSERT INTO recovered_items (item_id, recovered_by_user_id, recovered_person_name,
                                         recovered_person_email, recovered_person_image,
                                         recovery_date, recovered_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, item_id, recovered_by_user_id, recovered_person_name,
                      recovered_person_email, recovered_person_image, recovery_date,
                      recovered_location, created_at
            "#,
        )
        .bind(recovery.item_id)
        .bind(recovery.recovered_by_user_id)
        .bind(&recovery.recovered_person_name)
        .bind(&recovery.recovered_person_email)
        .bind(&recovery.recovered_person_image)
        .bind(recovery.recovery_date)
        .bind(&recovery.recovered_location)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_recoveries(&self) -> DatabaseResult<Vec<RecoveredItemWithItem>> {
        let rows = sqlx::query_as::<_, RecoveryRow>(
            r#"
            SELECT r.id, r.item_id, r.recovered_by_user_id, r.recovered_person_name,
                   r.recovered_person_email, r.recovered_person_image, r.recovery_date,
                   r.recovered_location, r.created_at,
                   i.title, i.description, i.post_type, i.category, i.location,
                   i.date_lost_found
            FROM recovered_items r
            JOIN items i ON i.id = r.item_id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RecoveredItemWithItem::from).collect())
    }
}

/// Flat row returned by the recovery/item join
#[derive(FromRow)]
struct RecoveryRow {
    id: Uuid,
    item_id: Uuid,
    recovered_by_user_id: Uuid,
    recovered_person_name: String,
    recovered_person_email: String,
    recovered_person_image: Option<String>,
    recovery_date: NaiveDate,
    recovered_location: String,
    created_at: DateTime<Utc>,
    title: String,
    description: String,
    post_type: PostType,
    category: Category,
    location: String,
    date_lost_found: NaiveDate,
}

impl From<RecoveryRow> for RecoveredItemWithItem {
    fn from(row: RecoveryRow) -> Self {
        RecoveredItemWithItem {
            recovery: RecoveredItem {
                id: row.id,
                item_id: row.item_id,
                recovered_by_user_id: row.recovered_by_user_id,
                recovered_person_name: row.recovered_person_name,
                recovered_person_email: row.recovered_person_email,
                recovered_person_image: row.recovered_person_image,
                recovery_date: row.recovery_date,
                recovered_location: row.recovered_location,
                created_at: row.created_at,
            },
            item: ItemSummary {
                title: row.title,
                description: row.description,
                post_type: row.post_type,
                category: row.category,
                location: row.location,
                date_lost_found: row.date_lost_found,
            },
        }
    }
}
