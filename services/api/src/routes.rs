//! API service routes

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ItemError},
    filter::filter_items,
    middleware::{AuthUser, auth_middleware},
    models::{
        ItemDraft, ItemListResponse, ItemPatch, ItemSearchQuery, RecentItemsQuery, RecoveryDraft,
        UploadQuery, UploadResponse,
    },
    storage::image_key,
    validation::ValidationError,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me/items", get(get_my_items))
        .route("/items", post(create_item))
        .route("/items/:id", put(update_item).delete(delete_item))
        .route("/items/:id/recover", post(mark_recovered))
        .route("/items/:id/recoveries", post(log_recovery))
        .route(
            "/uploads",
            post(upload_image).layer(DefaultBodyLimit::max(state.settings.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/items", get(get_active_items))
        .route("/items/recent", get(get_recent_items))
        .route("/items/:id", get(get_item))
        .route("/recovered", get(get_recovered_items))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => common::database::health_check(pool).await.unwrap_or(false),
        None => false,
    };

    Json(json!({
        "status": "ok",
        "service": "whereisit-api",
        "database": database,
    }))
}

/// List active items, optionally narrowed by a search term
pub async fn get_active_items(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ItemSearchQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.item_service.list_active_items().await?;
    let total = items.len();
    let items = filter_items(items, query.search.as_deref().unwrap_or_default());

    Ok(Json(ItemListResponse { items, total }))
}

/// Homepage preview of the newest items
pub async fn get_recent_items(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<RecentItemsQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.settings.recent_items_limit)
        .clamp(1, 100);
    let items = state.item_service.list_recent_items(limit).await?;

    Ok(Json(items))
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.item_service.get_item_by_id(id).await?;

    Ok(Json(item))
}

/// List recoveries with their items
pub async fn get_recovered_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let recoveries = state.item_service.list_recovered_items().await?;

    Ok(Json(recoveries))
}

/// List the current user's items
pub async fn get_my_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.item_service.list_items_by_owner(user.id).await?;

    Ok(Json(items))
}

/// Post a new lost or found item
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(mut draft), _): WithRejection<Json<ItemDraft>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if draft.contact_email.trim().is_empty() {
        if let Some(email) = &user.email {
            draft.contact_email = email.clone();
        }
    }

    let item = state.item_service.create_item(&draft, user.id).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item owned by the current user
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(patch), _): WithRejection<Json<ItemPatch>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.item_service.update_item(id, user.id, &patch).await?;

    Ok(Json(item))
}

/// Delete an item owned by the current user
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    state.item_service.delete_item(id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Mark an item owned by the current user as recovered
pub async fn mark_recovered(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.item_service.mark_recovered(id, user.id).await?;

    Ok(Json(item))
}

/// Log a recovery for an item
pub async fn log_recovery(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(draft), _): WithRejection<Json<RecoveryDraft>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let recovery = state.item_service.log_recovery(id, user.id, &draft).await?;

    Ok((StatusCode::CREATED, Json(recovery)))
}

/// Store an image and return its public URL
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<UploadQuery>, ApiError>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !content_type.starts_with("image/") {
        return Err(ItemError::from(ValidationError::UnsupportedUpload(format!(
            "content type {:?} is not an image",
            content_type
        )))
        .into());
    }
    if body.is_empty() {
        return Err(ItemError::from(ValidationError::UnsupportedUpload(
            "empty body".to_string(),
        ))
        .into());
    }

    let key = image_key(user.id, query.file_name.as_deref(), Utc::now());
    let url = state
        .image_storage
        .upload(&key, body.to_vec(), &content_type)
        .await
        .map_err(ItemError::from)?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, Response},
    };
    use http_body_util::BodyExt;
    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        middleware::{Claims, JwtVerifier},
        repositories::memory::InMemoryItemStore,
        service::ItemService,
        state::Settings,
        storage::memory::InMemoryImageStorage,
    };

    const SECRET: &[u8] = b"routes-test-secret";

    struct TestApp {
        router: Router,
        storage: Arc<InMemoryImageStorage>,
    }

    fn app() -> TestApp {
        let storage = Arc::new(InMemoryImageStorage::default());
        let state = AppState {
            db_pool: None,
            item_service: ItemService::new(Arc::new(InMemoryItemStore::new())),
            image_storage: storage.clone(),
            jwt_verifier: Arc::new(JwtVerifier::new(
                DecodingKey::from_secret(SECRET),
                Algorithm::HS256,
            )),
            settings: Settings {
                max_upload_bytes: 1024,
                recent_items_limit: 6,
            },
        };

        TestApp {
            router: create_router(state),
            storage,
        }
    }

    fn token(user: Uuid) -> String {
        let claims = Claims {
            sub: user,
            email: Some("poster@example.com".to_string()),
            exp: Utc::now().timestamp() as u64 + 600,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn wallet() -> Value {
        json!({
            "title": "Black Wallet",
            "description": "Leather wallet with a library card",
            "post_type": "Lost",
            "category": "other",
            "location": "Library",
            "date_lost_found": "2024-01-10",
            "contact_name": "A",
            "contact_email": "a@x.com",
        })
    }

    async fn create_wallet(router: &Router, owner: Uuid) -> Value {
        let response = send(router, Method::POST, "/items", Some(owner), Some(wallet())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = send(&app.router, Method::GET, "/health", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], false);
    }

    #[tokio::test]
    async fn test_writes_require_a_token() {
        let app = app();
        let response = send(&app.router, Method::POST, "/items", None, Some(wallet())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app.router, Method::GET, "/me/items", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/items/{}", Uuid::new_v4()))
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let app = app();
        let owner = Uuid::new_v4();

        let mut draft = wallet();
        draft["is_recovered"] = json!(true);
        let response = send(&app.router, Method::POST, "/items", Some(owner), Some(draft)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["is_recovered"], false);
        assert_eq!(created["user_id"], owner.to_string());

        let uri = format!("/items/{}", created["id"].as_str().unwrap());
        let response = send(&app.router, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, created);

        let response = send(&app.router, Method::GET, "/me/items", Some(owner), None).await;
        let mine = json_body(response).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["title"], "Black Wallet");
    }

    #[tokio::test]
    async fn test_contact_email_defaults_to_token_email() {
        let app = app();
        let mut draft = wallet();
        draft["contact_email"] = json!("");

        let response = send(
            &app.router,
            Method::POST,
            "/items",
            Some(Uuid::new_v4()),
            Some(draft),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["contact_email"], "poster@example.com");
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_requests() {
        let app = app();
        let mut draft = wallet();
        draft["category"] = json!("Electronics");

        let response = send(
            &app.router,
            Method::POST,
            "/items",
            Some(Uuid::new_v4()),
            Some(draft),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Electronics"));
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let app = app();
        let user = Uuid::new_v4();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/items")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = send(
            &app.router,
            Method::POST,
            "/items",
            Some(user),
            Some(json!({ "title": 5 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = send(&app.router, Method::GET, "/items/not-a-uuid", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = send(
            &app.router,
            Method::DELETE,
            "/items/not-a-uuid",
            Some(user),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = send(&app.router, Method::GET, "/items/recent?limit=many", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let app = app();
        let uri = format!("/items/{}", Uuid::new_v4());
        let response = send(&app.router, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let app = app();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let created = create_wallet(&app.router, owner).await;
        let uri = format!("/items/{}", created["id"].as_str().unwrap());

        let response = send(
            &app.router,
            Method::PUT,
            &uri,
            Some(intruder),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app.router, Method::DELETE, &uri, Some(intruder), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let recover_uri = format!("{uri}/recover");
        let response = send(&app.router, Method::POST, &recover_uri, Some(intruder), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app.router, Method::GET, &uri, None, None).await;
        assert_eq!(json_body(response).await, created);
    }

    #[tokio::test]
    async fn test_owner_lifecycle() {
        let app = app();
        let owner = Uuid::new_v4();
        let created = create_wallet(&app.router, owner).await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/items/{id}");

        let response = send(
            &app.router,
            Method::PUT,
            &uri,
            Some(owner),
            Some(json!({ "location": "Library, 2nd floor" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["location"], "Library, 2nd floor");

        let response = send(
            &app.router,
            Method::POST,
            &format!("{uri}/recover"),
            Some(owner),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["is_recovered"], true);

        let response = send(&app.router, Method::GET, "/items", None, None).await;
        let listing = json_body(response).await;
        assert_eq!(listing["total"], 0);
        assert!(listing["items"].as_array().unwrap().is_empty());

        let response = send(&app.router, Method::GET, "/items/recent", None, None).await;
        let recent = json_body(response).await;
        assert_eq!(recent[0]["id"], id.as_str());

        let response = send(&app.router, Method::DELETE, &uri, Some(owner), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app.router, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_listing() {
        let app = app();
        let owner = Uuid::new_v4();
        create_wallet(&app.router, owner).await;

        let mut umbrella = wallet();
        umbrella["title"] = json!("Blue Umbrella");
        umbrella["description"] = json!("Folding umbrella");
        umbrella["location"] = json!("Bus stop");
        let response = send(&app.router, Method::POST, "/items", Some(owner), Some(umbrella)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app.router, Method::GET, "/items?search=LIBRARY", None, None).await;
        let listing = json_body(response).await;
        assert_eq!(listing["total"], 2);
        assert_eq!(listing["items"].as_array().unwrap().len(), 1);
        assert_eq!(listing["items"][0]["title"], "Black Wallet");

        let response = send(&app.router, Method::GET, "/items?search=", None, None).await;
        let listing = json_body(response).await;
        assert_eq!(listing["items"][0]["title"], "Blue Umbrella");
        assert_eq!(listing["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_log_and_list_recoveries() {
        let app = app();
        let owner = Uuid::new_v4();
        let finder = Uuid::new_v4();
        let created = create_wallet(&app.router, owner).await;
        let uri = format!("/items/{}/recoveries", created["id"].as_str().unwrap());

        let response = send(
            &app.router,
            Method::POST,
            &uri,
            Some(finder),
            Some(json!({
                "recovered_person_name": "B",
                "recovered_person_email": "b@x.com",
                "recovery_date": "2024-01-12",
                "recovered_location": "Front desk",
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let recovery = json_body(response).await;
        assert_eq!(recovery["recovered_by_user_id"], finder.to_string());

        let response = send(&app.router, Method::GET, "/recovered", None, None).await;
        let recoveries = json_body(response).await;
        assert_eq!(recoveries.as_array().unwrap().len(), 1);
        assert_eq!(recoveries[0]["id"], recovery["id"]);
        assert_eq!(recoveries[0]["item"]["title"], "Black Wallet");
        assert_eq!(recoveries[0]["item"]["category"], "other");
    }

    #[tokio::test]
    async fn test_upload_image() {
        let app = app();
        let user = Uuid::new_v4();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads?file_name=wallet.png")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(vec![0x89, b'P', b'N', b'G']))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let url = json_body(response).await["url"].as_str().unwrap().to_string();
        assert!(url.starts_with(&format!("memory://item-images/{user}/")));
        assert!(url.ends_with(".png"));

        let objects = app.storage.objects.lock().await;
        assert_eq!(objects.len(), 1);
        let (data, content_type) = objects.values().next().unwrap();
        assert_eq!(data.as_slice(), &[0x89, b'P', b'N', b'G']);
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images_and_oversized_bodies() {
        let app = app();
        let user = Uuid::new_v4();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads?file_name=notes.txt")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads?file_name=huge.jpg")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::from(vec![0u8; 4096]))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        assert!(app.storage.objects.lock().await.is_empty());
    }
}
