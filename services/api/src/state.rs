//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::{middleware::JwtVerifier, service::ItemService, storage::ImageStorage};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Absent when the service runs without a database, e.g. in tests
    pub db_pool: Option<PgPool>,
    pub item_service: ItemService,
    pub image_storage: Arc<dyn ImageStorage>,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub settings: Settings,
}

/// Request-handling knobs taken from the service configuration
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub max_upload_bytes: usize,
    pub recent_items_limit: u32,
}
