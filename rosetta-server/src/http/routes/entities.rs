//! CRUD endpoints shared by users, forums, threads and posts
//!
//! Handlers are generic over the entity; [`router`] mounts one set per
//! resource path.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::{Detailed, Entity, Insertable, Models, Patchable, RepositoryFor};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidQuery, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Filter, FilterParams};

/// POST /{resource}
async fn create<I>(
    State(state): State<Arc<AppState>>,
    Json(input): Json<I>,
) -> Result<(StatusCode, Json<I::Entity>), ApiError>
where
    I: Insertable,
    I::Entity: Serialize,
    Models: RepositoryFor<I::Entity>,
{
    let created = RepositoryFor::<I::Entity>::repository(&state.models).create(&input).await?;
    tracing::info!(
        resource = I::Entity::SCHEMA.resource,
        id = %created.id(),
        "created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /{resource}, with related rows per entity when `include=true`
async fn list<E>(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<FilterParams>,
) -> Result<Response, ApiError>
where
    E: Detailed + Serialize,
    Models: RepositoryFor<E>,
{
    let include = params.include.unwrap_or(false);
    let filter = Filter::from(params);

    if include {
        let page = E::list_details(&state.models, &filter).await?;
        return Ok(Json(page).into_response());
    }
    let page = RepositoryFor::<E>::repository(&state.models).list(&filter).await?;
    Ok(Json(page).into_response())
}

/// GET /{resource}/{id}
async fn get_one<E>(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<E>, ApiError>
where
    E: Entity + Serialize,
    Models: RepositoryFor<E>,
{
    Ok(Json(RepositoryFor::<E>::repository(&state.models).get(id).await?))
}

/// PATCH /{resource}/{id}
async fn patch<P>(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Json(mut patch): Json<P>,
) -> Result<Json<P::Entity>, ApiError>
where
    P: Patchable,
    P::Entity: Serialize,
    Models: RepositoryFor<P::Entity>,
{
    patch.set_id(id);
    Ok(Json(RepositoryFor::<P::Entity>::repository(&state.models).patch(&patch).await?))
}

/// DELETE /{resource}/{id}
async fn soft_delete<E>(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<E>, ApiError>
where
    E: Entity + Serialize,
    Models: RepositoryFor<E>,
{
    Ok(Json(RepositoryFor::<E>::repository(&state.models).soft_delete(id).await?))
}

/// POST /{resource}/{id}/restore
async fn restore<E>(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<E>, ApiError>
where
    E: Entity + Serialize,
    Models: RepositoryFor<E>,
{
    Ok(Json(RepositoryFor::<E>::repository(&state.models).restore(id).await?))
}

/// DELETE /{resource}/{id}/purge
async fn hard_delete<E>(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<E>, ApiError>
where
    E: Entity + Serialize,
    Models: RepositoryFor<E>,
{
    let deleted = RepositoryFor::<E>::repository(&state.models).hard_delete(id).await?;
    tracing::info!(resource = E::SCHEMA.resource, %id, "purged");
    Ok(Json(deleted))
}

/// CRUD routes for one resource mounted at `path`
pub fn router<E, I, P>(path: &str) -> Router<Arc<AppState>>
where
    E: Detailed + Serialize,
    I: Insertable<Entity = E> + DeserializeOwned + 'static,
    P: Patchable<Entity = E> + DeserializeOwned + 'static,
    Models: RepositoryFor<E>,
{
    Router::new()
        .route(path, post(create::<I>).get(list::<E>))
        .route(
            &format!("{path}/{{id}}"),
            get(get_one::<E>)
                .patch(patch::<P>)
                .delete(soft_delete::<E>),
        )
        .route(&format!("{path}/{{id}}/restore"), post(restore::<E>))
        .route(&format!("{path}/{{id}}/purge"), delete(hard_delete::<E>))
}
