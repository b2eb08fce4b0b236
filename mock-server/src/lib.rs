//! In-memory stand-in for the blog backend's REST API.
//!
//! Serves the same routes, status codes and JSON envelopes as the real
//! backend so clients can be exercised end to end without a database.

pub mod store;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use store::{Category, CategoryInput, Post, PostInput, Store, StoreError};

pub type Db = Arc<RwLock<Store>>;

/// Router with the default view cooldown.
pub fn app() -> Router {
    app_with_cooldown(store::DEFAULT_VIEW_COOLDOWN)
}

pub fn app_with_cooldown(view_cooldown: Duration) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(view_cooldown)));
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/all", get(list_all_categories))
        .route("/categories/slug/{slug}", get(get_category_by_slug))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/all", get(list_all_posts))
        .route("/posts/slug/{slug}", get(get_post_by_slug))
        .route("/posts/slug/{slug}/view", post(track_post_view))
        .route("/posts/category/{slug}", get(list_posts_by_category))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "blog mock server listening");
    }
    axum::serve(listener, app).await
}

/// Failure responses in the backend's shapes.
#[derive(Debug)]
enum ApiFailure {
    /// 404 with an empty body, as the read endpoints answer.
    NotFound,
    /// Any status with an `{"error": ...}` envelope.
    Envelope(StatusCode, String),
    /// 400 with a `{"<field>": "<message>"}` validation map.
    Validation(&'static str, &'static str),
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            ApiFailure::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiFailure::Envelope(status, message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiFailure::Validation(field, message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ field: message }))).into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

/// Mapping for reads: a missing resource is a bare 404.
fn read_failure(err: StoreError) -> ApiFailure {
    match err {
        StoreError::NotFound(_) => ApiFailure::NotFound,
        other => ApiFailure::Envelope(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Mapping for creates: every rule violation is a 500 with a prefixed message.
fn create_failure(entity: &str, err: StoreError) -> ApiFailure {
    match err {
        StoreError::Invalid { field, message } => ApiFailure::Validation(field, message),
        other => ApiFailure::Envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error creating {entity}: {other}"),
        ),
    }
}

/// Mapping for updates: missing is a bare 404, conflicts are 400.
fn update_failure(err: StoreError) -> ApiFailure {
    match err {
        StoreError::NotFound(_) => ApiFailure::NotFound,
        StoreError::Invalid { field, message } => ApiFailure::Validation(field, message),
        other => ApiFailure::Envelope(StatusCode::BAD_REQUEST, other.to_string()),
    }
}

/// Mapping for deletes: missing is a 404 envelope, rule violations are 400.
fn delete_failure(entity: &str, err: StoreError) -> ApiFailure {
    match err {
        StoreError::NotFound(_) => {
            ApiFailure::Envelope(StatusCode::NOT_FOUND, format!("{entity} not found"))
        }
        other => ApiFailure::Envelope(StatusCode::BAD_REQUEST, other.to_string()),
    }
}

// --- categories ---

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    Json(db.read().await.active_categories())
}

async fn list_all_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    Json(db.read().await.all_categories())
}

async fn get_category_by_slug(
    State(db): State<Db>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Category>> {
    db.read()
        .await
        .category_with_posts(&slug)
        .map(Json)
        .map_err(read_failure)
}

async fn get_category(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Category>> {
    db.read().await.category(id).map(Json).map_err(read_failure)
}

async fn create_category(
    State(db): State<Db>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = db
        .write()
        .await
        .create_category(input)
        .map_err(|e| create_failure("category", e))?;
    info!(id = category.id, slug = %category.slug, "created category");
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    db.write()
        .await
        .update_category(id, input)
        .map(Json)
        .map_err(update_failure)
}

async fn delete_category(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    db.write()
        .await
        .delete_category(id)
        .map_err(|e| delete_failure("Category", e))?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}

// --- posts ---

async fn list_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    Json(db.read().await.published_posts())
}

async fn list_all_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    Json(db.read().await.all_posts())
}

async fn get_post_by_slug(State(db): State<Db>, Path(slug): Path<String>) -> ApiResult<Json<Post>> {
    db.read()
        .await
        .published_post(&slug)
        .map(Json)
        .map_err(read_failure)
}

async fn get_post(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Post>> {
    db.read().await.post(id).map(Json).map_err(read_failure)
}

async fn list_posts_by_category(
    State(db): State<Db>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    db.read()
        .await
        .posts_in_category(&slug)
        .map(Json)
        .map_err(read_failure)
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<PostInput>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = db
        .write()
        .await
        .create_post(input)
        .map_err(|e| create_failure("post", e))?;
    info!(id = post.id, slug = %post.slug, "created post");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<PostInput>,
) -> ApiResult<Json<Post>> {
    db.write()
        .await
        .update_post(id, input)
        .map(Json)
        .map_err(update_failure)
}

async fn delete_post(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    db.write()
        .await
        .delete_post(id)
        .map_err(|e| delete_failure("Post", e))?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn track_post_view(State(db): State<Db>, Path(slug): Path<String>) -> ApiResult<Json<Value>> {
    let tracked = db.write().await.track_view(&slug).map_err(read_failure)?;
    if tracked {
        info!(slug = %slug, "view count incremented");
    }
    let message = if tracked {
        "View tracked"
    } else {
        "View rate-limited (already tracked recently)"
    };
    Ok(Json(json!({ "tracked": tracked, "message": message })))
}
