//! Forums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{optional_text, require_text, ValidationError};
use crate::db::schema::{Column, Entity, Insertable, Patchable, TableSchema};
use crate::db::value::{ColumnType, SqlValue};

const MAX_NAME_LEN: usize = 256;
const MAX_DESCRIPTION_LEN: usize = 4096;

pub const FORUMS: TableSchema = TableSchema {
    table: "forum.forums",
    alias: "forums",
    resource: "forum",
    select: "id, owner_id, name, description, created_at, updated_at, deleted, deleted_at",
    filterable: &[
        Column::new("id", ColumnType::Uuid),
        Column::new("owner_id", ColumnType::Uuid),
        Column::new("name", ColumnType::Text),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp),
        Column::new("deleted", ColumnType::Bool),
        Column::new("deleted_at", ColumnType::Timestamp),
    ],
    sortable: &["id", "name", "created_at", "updated_at", "deleted_at"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Forum {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Forum {
    const SCHEMA: &'static TableSchema = &FORUMS;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumInput {
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Insertable for ForumInput {
    type Entity = Forum;

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("owner_id", self.owner_id.into()),
            ("name", self.name.as_str().into()),
            ("description", self.description.clone().into()),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumPatch {
    #[serde(default)]
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Patchable for ForumPatch {
    type Entity = Forum;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(owner_id) = self.owner_id {
            set.push(("owner_id", owner_id.into()));
        }
        if let Some(name) = &self.name {
            set.push(("name", name.as_str().into()));
        }
        if let Some(description) = &self.description {
            set.push(("description", description.as_str().into()));
        }
        set
    }

    fn validate(&self) -> Result<(), ValidationError> {
        optional_text("name", self.name.as_deref(), MAX_NAME_LEN)?;
        optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }
}
