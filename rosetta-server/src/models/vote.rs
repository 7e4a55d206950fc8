//! Thread and post votes
//!
//! A vote row exists only while its value is non-zero. Casting 0 removes it.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ValidationError;
use crate::db::schema::{Vote, VoteSchema};

pub const THREAD_VOTES: VoteSchema = VoteSchema {
    table: "forum.thread_votes",
    target_column: "thread_id",
    resource: "thread vote",
};

pub const POST_VOTES: VoteSchema = VoteSchema {
    table: "forum.post_votes",
    target_column: "post_id",
    resource: "post vote",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ThreadVote {
    pub thread_id: Uuid,
    pub user_id: Uuid,
    pub vote: i16,
}

impl Vote for ThreadVote {
    const SCHEMA: &'static VoteSchema = &THREAD_VOTES;

    fn target_id(&self) -> Uuid {
        self.thread_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PostVote {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub vote: i16,
}

impl Vote for PostVote {
    const SCHEMA: &'static VoteSchema = &POST_VOTES;

    fn target_id(&self) -> Uuid {
        self.post_id
    }
}

/// Vote cast by a user; the target comes from the request path
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteInput {
    pub user_id: Uuid,
    pub vote: i16,
}

impl VoteInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-1..=1).contains(&self.vote) {
            return Err(ValidationError::OutOfRange {
                field: "vote",
                min: -1,
                max: 1,
            });
        }
        Ok(())
    }
}

/// Aggregate of all votes on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSummary {
    pub target_id: Uuid,
    pub score: i64,
    pub votes: i64,
}
