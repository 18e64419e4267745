//! Recovery records: the audit trail of items reunited with their owners

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::item::{Category, PostType};

/// A logged reunification event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecoveredItem {
    pub id: Uuid,
    pub item_id: Uuid,
    pub recovered_by_user_id: Uuid,
    pub recovered_person_name: String,
    pub recovered_person_email: String,
    pub recovered_person_image: Option<String>,
    pub recovery_date: NaiveDate,
    pub recovered_location: String,
    pub created_at: DateTime<Utc>,
}

/// Recovery form payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryDraft {
    pub recovered_person_name: String,
    pub recovered_person_email: String,
    pub recovered_person_image: Option<String>,
    pub recovery_date: String,
    pub recovered_location: String,
}

/// Validated recovery insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecoveredItem {
    pub item_id: Uuid,
    pub recovered_by_user_id: Uuid,
    pub recovered_person_name: String,
    pub recovered_person_email: String,
    pub recovered_person_image: Option<String>,
    pub recovery_date: NaiveDate,
    pub recovered_location: String,
}

/// The parent item columns shown next to a recovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub title: String,
    pub description: String,
    pub post_type: PostType,
    pub category: Category,
    pub location: String,
    pub date_lost_found: NaiveDate,
}

/// A recovery joined with its parent item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveredItemWithItem {
    #[serde(flatten)]
    pub recovery: RecoveredItem,
    pub item: ItemSummary,
}
