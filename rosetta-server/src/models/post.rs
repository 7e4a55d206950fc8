//! Posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{optional_text, require_text, ValidationError};
use crate::db::schema::{Column, Entity, Insertable, Patchable, TableSchema};
use crate::db::value::{ColumnType, SqlValue};

const MAX_CONTENT_LEN: usize = 65_536;

pub const POSTS: TableSchema = TableSchema {
    table: "forum.posts",
    alias: "posts",
    resource: "post",
    select: "id, thread_id, reply_to, author_id, content, created_at, updated_at, deleted, deleted_at",
    filterable: &[
        Column::new("id", ColumnType::Uuid),
        Column::new("thread_id", ColumnType::Uuid),
        Column::new("reply_to", ColumnType::Uuid),
        Column::new("author_id", ColumnType::Uuid),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp),
        Column::new("deleted", ColumnType::Bool),
        Column::new("deleted_at", ColumnType::Timestamp),
    ],
    sortable: &["id", "created_at", "updated_at", "deleted_at"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    /// Post this one replies to, if any
    pub reply_to: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Post {
    const SCHEMA: &'static TableSchema = &POSTS;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub thread_id: Uuid,
    #[serde(default)]
    pub reply_to: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
}

impl Insertable for PostInput {
    type Entity = Post;

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("thread_id", self.thread_id.into()),
            ("reply_to", self.reply_to.into()),
            ("author_id", self.author_id.into()),
            ("content", self.content.as_str().into()),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content, MAX_CONTENT_LEN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(default)]
    pub id: Uuid,
    pub reply_to: Option<Uuid>,
    pub content: Option<String>,
}

impl Patchable for PostPatch {
    type Entity = Post;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(reply_to) = self.reply_to {
            set.push(("reply_to", reply_to.into()));
        }
        if let Some(content) = &self.content {
            set.push(("content", content.as_str().into()));
        }
        set
    }

    fn validate(&self) -> Result<(), ValidationError> {
        optional_text("content", self.content.as_deref(), MAX_CONTENT_LEN)
    }
}
