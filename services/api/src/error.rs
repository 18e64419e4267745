//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

use crate::{storage::StorageError, validation::ValidationError};

/// Outcome of an item operation that did not succeed
#[derive(Error, Debug)]
pub enum ItemError {
    /// Payload rejected before any remote call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No row matches the requested id
    #[error("Item not found")]
    NotFound,

    /// The caller does not own the item
    #[error("Only the owner of this item may change it")]
    Unauthorized,

    /// Remote store or object storage failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<DatabaseError> for ItemError {
    fn from(err: DatabaseError) -> Self {
        ItemError::Backend(err.to_string())
    }
}

impl From<StorageError> for ItemError {
    fn from(err: StorageError) -> Self {
        ItemError::Backend(err.to_string())
    }
}

/// Type alias for item operation results
pub type ItemResult<T> = Result<T, ItemError>;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to touch the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<ItemError> for ApiError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::Validation(e) => ApiError::BadRequest(e.to_string()),
            ItemError::NotFound => ApiError::NotFound("Item not found".to_string()),
            ItemError::Unauthorized => {
                ApiError::Forbidden("Only the owner of this item may change it".to_string())
            }
            ItemError::Backend(cause) => {
                tracing::error!("Backend failure: {}", cause);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
