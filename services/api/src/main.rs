use std::sync::Arc;

use anyhow::Result;
use aws_config::BehaviorVersion;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod filter;
mod middleware;
mod models;
mod repositories;
mod routes;
mod service;
mod state;
mod storage;
mod validation;

use common::database::{self, DatabaseConfig};
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    middleware::JwtVerifier,
    repositories::PgItemStore,
    service::ItemService,
    state::{AppState, Settings},
    storage::S3ImageStorage,
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting WhereIsIt API service");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool, &MIGRATOR).await?;

    // Initialize object storage
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let image_storage = S3ImageStorage::new(
        s3_client,
        config.storage_bucket.clone(),
        &config.storage_public_url,
    );

    let jwt_verifier = JwtVerifier::from_public_key(&config.jwt_public_key)?;

    let app_state = AppState {
        db_pool: Some(pool.clone()),
        item_service: ItemService::new(Arc::new(PgItemStore::new(pool))),
        image_storage: Arc::new(image_storage),
        jwt_verifier: Arc::new(jwt_verifier),
        settings: Settings {
            max_upload_bytes: config.max_upload_bytes,
            recent_items_limit: config.recent_items_limit,
        },
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("API service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
