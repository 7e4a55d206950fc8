//! Route handlers organized by resource

pub mod health;
pub mod entities;
pub mod threads;
pub mod details;
pub mod votes;

use std::sync::Arc;

use axum::Router;

use super::server::AppState;
use crate::models::{
    Forum, ForumInput, ForumPatch, Post, PostInput, PostPatch, PostVote, Thread, ThreadInput,
    ThreadPatch, ThreadVote, User, UserInput, UserPatch,
};

/// Every `/api/v1` route
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(entities::router::<User, UserInput, UserPatch>("/users"))
        .merge(entities::router::<Forum, ForumInput, ForumPatch>("/forums"))
        .merge(entities::router::<Thread, ThreadInput, ThreadPatch>("/threads"))
        .merge(entities::router::<Post, PostInput, PostPatch>("/posts"))
        .merge(threads::router())
        .merge(details::router())
        .merge(votes::router::<ThreadVote>("/threads"))
        .merge(votes::router::<PostVote>("/posts"))
}
