//! Composite reads: an entity plus its related rows and counts

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{ForumDetails, PostDetails, ThreadDetails};
use crate::http::error::ApiError;
use crate::http::extractors::ValidUuid;
use crate::http::server::AppState;

/// GET /forums/{id}/details
async fn forum(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ForumDetails>, ApiError> {
    Ok(Json(state.models.forum_details(id).await?))
}

/// GET /threads/{id}/details
async fn thread(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ThreadDetails>, ApiError> {
    Ok(Json(state.models.thread_details(id).await?))
}

/// GET /posts/{id}/details
async fn post(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<PostDetails>, ApiError> {
    Ok(Json(state.models.post_details(id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/forums/{id}/details", get(forum))
        .route("/threads/{id}/details", get(thread))
        .route("/posts/{id}/details", get(post))
}
