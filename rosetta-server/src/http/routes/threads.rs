//! Thread moderation endpoints

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::ValidUuid;
use crate::http::server::AppState;
use crate::models::Thread;

/// POST /threads/{id}/lock
async fn lock(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Thread>, ApiError> {
    let thread = state.models.threads.lock(id).await?;
    tracing::info!(%id, "thread locked");
    Ok(Json(thread))
}

/// POST /threads/{id}/unlock
async fn unlock(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Thread>, ApiError> {
    let thread = state.models.threads.unlock(id).await?;
    tracing::info!(%id, "thread unlocked");
    Ok(Json(thread))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/threads/{id}/lock", post(lock))
        .route("/threads/{id}/unlock", post(unlock))
}
