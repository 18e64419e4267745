//! API models for items, recoveries and request/response payloads

use serde::{Deserialize, Serialize};

pub mod item;
pub mod recovery;

pub use item::{
    Category, Item, ItemChanges, ItemDraft, ItemListResponse, ItemPatch, ItemQuery,
    ItemSearchQuery, ItemState, NewItem, PostType, RecentItemsQuery,
};
pub use recovery::{
    ItemSummary, NewRecoveredItem, RecoveredItem, RecoveredItemWithItem, RecoveryDraft,
};

/// Query string for image uploads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    pub file_name: Option<String>,
}

/// Response for a stored image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
