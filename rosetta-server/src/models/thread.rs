//! Threads
//!
//! `likes` is not a stored column. It is recomputed from `thread_votes` on
//! every read so it can never drift from the votes themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{optional_text, require_text, ValidationError};
use crate::db::schema::{Column, Entity, Insertable, Patchable, TableSchema};
use crate::db::value::{ColumnType, SqlValue};

const MAX_TITLE_LEN: usize = 256;

pub const THREADS: TableSchema = TableSchema {
    table: "forum.threads",
    alias: "threads",
    resource: "thread",
    select: "id, forum_id, author_id, title, is_locked, \
             (SELECT COALESCE(SUM(v.vote), 0) FROM forum.thread_votes AS v \
              WHERE v.thread_id = threads.id)::BIGINT AS likes, \
             created_at, updated_at, deleted, deleted_at",
    filterable: &[
        Column::new("id", ColumnType::Uuid),
        Column::new("forum_id", ColumnType::Uuid),
        Column::new("author_id", ColumnType::Uuid),
        Column::new("title", ColumnType::Text),
        Column::new("is_locked", ColumnType::Bool),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp),
        Column::new("deleted", ColumnType::Bool),
        Column::new("deleted_at", ColumnType::Timestamp),
    ],
    sortable: &["id", "title", "created_at", "updated_at", "deleted_at"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Thread {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub is_locked: bool,
    /// Sum of all votes on this thread
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Thread {
    const SCHEMA: &'static TableSchema = &THREADS;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInput {
    pub forum_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
}

impl Insertable for ThreadInput {
    type Entity = Thread;

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("forum_id", self.forum_id.into()),
            ("author_id", self.author_id.into()),
            ("title", self.title.as_str().into()),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_TITLE_LEN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadPatch {
    #[serde(default)]
    pub id: Uuid,
    pub forum_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub title: Option<String>,
    pub is_locked: Option<bool>,
}

impl ThreadPatch {
    /// Patch that only sets the lock flag.
    pub fn locked(id: Uuid, is_locked: bool) -> Self {
        Self {
            id,
            is_locked: Some(is_locked),
            ..Default::default()
        }
    }
}

impl Patchable for ThreadPatch {
    type Entity = Thread;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(forum_id) = self.forum_id {
            set.push(("forum_id", forum_id.into()));
        }
        if let Some(author_id) = self.author_id {
            set.push(("author_id", author_id.into()));
        }
        if let Some(title) = &self.title {
            set.push(("title", title.as_str().into()));
        }
        if let Some(is_locked) = self.is_locked {
            set.push(("is_locked", is_locked.into()));
        }
        set
    }

    fn validate(&self) -> Result<(), ValidationError> {
        optional_text("title", self.title.as_deref(), MAX_TITLE_LEN)
    }
}
