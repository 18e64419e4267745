//! Service configuration
//!
//! Settings are read from `WHEREISIT_*` environment variables on top of the
//! defaults below. Database settings are loaded separately through
//! [`common::database::DatabaseConfig::from_env`].

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// API service settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// RS256 public key of the identity provider, as PEM or a path to a PEM file
    pub jwt_public_key: String,
    /// Bucket receiving uploaded images
    pub storage_bucket: String,
    /// Base URL under which uploaded objects are publicly reachable
    pub storage_public_url: String,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
    /// Default size of the recent-items preview
    pub recent_items_limit: u32,
}

impl AppConfig {
    pub const ENV_PREFIX: &'static str = "WHEREISIT";

    /// Load settings from the environment
    ///
    /// # Environment Variables
    /// - `WHEREISIT_BIND_ADDRESS` (default: `0.0.0.0:3001`)
    /// - `WHEREISIT_JWT_PUBLIC_KEY` (required)
    /// - `WHEREISIT_STORAGE_BUCKET` (default: `item-images`)
    /// - `WHEREISIT_STORAGE_PUBLIC_URL` (default: `http://localhost:9000/item-images`)
    /// - `WHEREISIT_MAX_UPLOAD_BYTES` (default: 5 MiB)
    /// - `WHEREISIT_RECENT_ITEMS_LIMIT` (default: 6)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("storage_bucket", "item-images")?
            .set_default("storage_public_url", "http://localhost:9000/item-images")?
            .set_default("max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("recent_items_limit", 6)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
