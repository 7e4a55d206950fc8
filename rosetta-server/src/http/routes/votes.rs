//! Vote endpoints, mounted once per votable resource

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::db::{DbError, Models, Vote, VoteRepositoryFor};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidUuid, ValidUuidPair};
use crate::http::server::AppState;
use crate::models::{VoteInput, VoteSummary};

/// PUT /{resource}/{id}/votes
///
/// Casting 0 withdraws the caller's vote. Responds with the new summary.
async fn cast<V>(
    State(state): State<Arc<AppState>>,
    ValidUuid(target_id): ValidUuid,
    Json(input): Json<VoteInput>,
) -> Result<Json<VoteSummary>, ApiError>
where
    V: Vote,
    Models: VoteRepositoryFor<V>,
{
    input.validate()?;

    let votes = VoteRepositoryFor::<V>::votes(&state.models);
    votes.cast_vote(target_id, input.user_id, input.vote).await?;
    Ok(Json(votes.summary(target_id).await?))
}

/// GET /{resource}/{id}/votes
async fn summary<V>(
    State(state): State<Arc<AppState>>,
    ValidUuid(target_id): ValidUuid,
) -> Result<Json<VoteSummary>, ApiError>
where
    V: Vote,
    Models: VoteRepositoryFor<V>,
{
    Ok(Json(VoteRepositoryFor::<V>::votes(&state.models).summary(target_id).await?))
}

/// GET /{resource}/{id}/votes/{user_id}
async fn user_vote<V>(
    State(state): State<Arc<AppState>>,
    ValidUuidPair(target_id, user_id): ValidUuidPair,
) -> Result<Json<V>, ApiError>
where
    V: Vote + Serialize,
    Models: VoteRepositoryFor<V>,
{
    match VoteRepositoryFor::<V>::votes(&state.models).get_vote(target_id, user_id).await? {
        Some(vote) => Ok(Json(vote)),
        None => Err(DbError::NotFound {
            resource: V::SCHEMA.resource,
            id: format!("{target_id}/{user_id}"),
        }
        .into()),
    }
}

pub fn router<V>(path: &str) -> Router<Arc<AppState>>
where
    V: Vote + Serialize,
    Models: VoteRepositoryFor<V>,
{
    Router::new()
        .route(
            &format!("{path}/{{id}}/votes"),
            put(cast::<V>).get(summary::<V>),
        )
        .route(&format!("{path}/{{id}}/votes/{{user_id}}"), get(user_vote::<V>))
}
