//! Item model, its closed enumerations and lifecycle state

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Whether the poster lost or found the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_type")]
pub enum PostType {
    Lost,
    Found,
}

impl PostType {
    pub const ALL: [PostType; 2] = [PostType::Lost, PostType::Found];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Lost => "Lost",
            PostType::Found => "Found",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|post_type| post_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Item category, a fixed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "item_category", rename_all = "lowercase")]
pub enum Category {
    Pets,
    Documents,
    Gadgets,
    Clothing,
    Jewelry,
    Keys,
    Bags,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Pets,
        Category::Documents,
        Category::Gadgets,
        Category::Clothing,
        Category::Jewelry,
        Category::Keys,
        Category::Bags,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pets => "pets",
            Category::Documents => "documents",
            Category::Gadgets => "gadgets",
            Category::Clothing => "clothing",
            Category::Jewelry => "jewelry",
            Category::Keys => "keys",
            Category::Bags => "bags",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Lifecycle state derived from `is_recovered`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Active,
    Recovered,
}

impl ItemState {
    /// The only edge is Active -> Recovered.
    pub fn can_transition_to(self, next: ItemState) -> bool {
        matches!((self, next), (ItemState::Active, ItemState::Recovered))
    }
}

/// A lost or found posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub post_type: PostType,
    pub category: Category,
    pub location: String,
    pub date_lost_found: NaiveDate,
    pub thumbnail_url: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub is_recovered: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn state(&self) -> ItemState {
        if self.is_recovered {
            ItemState::Recovered
        } else {
            ItemState::Active
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Add-item form payload as submitted by a client
///
/// Fields arrive as plain strings and are checked by
/// [`crate::validation::validate_item_draft`] before anything is written.
/// `is_recovered` is accepted for compatibility but never honoured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    pub post_type: String,
    pub category: String,
    pub location: String,
    pub date_lost_found: String,
    pub thumbnail_url: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub is_recovered: bool,
}

/// Validated insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub post_type: PostType,
    pub category: Category,
    pub location: String,
    pub date_lost_found: NaiveDate,
    pub thumbnail_url: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub user_id: Uuid,
}

/// Update-item form payload; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub post_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date_lost_found: Option<String>,
    pub thumbnail_url: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}

/// Validated column changes applied by the store
///
/// `is_recovered` can only ever be set to `true`, and only by
/// [`crate::service::ItemService::mark_recovered`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub post_type: Option<PostType>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub date_lost_found: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub(crate) mark_recovered: bool,
}

impl ItemChanges {
    pub(crate) fn recovered() -> Self {
        Self {
            mark_recovered: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes to an in-memory row
    #[cfg(test)]
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(post_type) = self.post_type {
            item.post_type = post_type;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(location) = &self.location {
            item.location = location.clone();
        }
        if let Some(date) = self.date_lost_found {
            item.date_lost_found = date;
        }
        if let Some(url) = &self.thumbnail_url {
            item.thumbnail_url = Some(url.clone());
        }
        if let Some(name) = &self.contact_name {
            item.contact_name = name.clone();
        }
        if let Some(email) = &self.contact_email {
            item.contact_email = email.clone();
        }
        if self.mark_recovered {
            item.is_recovered = true;
        }
    }
}

/// Store-level listing predicate, always ordered by `created_at` descending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub is_recovered: Option<bool>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl ItemQuery {
    #[cfg(test)]
    pub fn matches(&self, item: &Item) -> bool {
        self.is_recovered.is_none_or(|flag| item.is_recovered == flag)
            && self.user_id.is_none_or(|owner| item.user_id == owner)
    }
}

/// Search query string for listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemSearchQuery {
    pub search: Option<String>,
}

/// Limit query string for the recent-items preview
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentItemsQuery {
    pub limit: Option<u32>,
}

/// Response for a filtered listing
#[derive(Debug, Clone, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    /// Number of items before the search filter was applied
    pub total: usize,
}
