//! Users

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{optional_text, require_text, ValidationError};
use crate::db::schema::{Column, Entity, Insertable, Patchable, TableSchema};
use crate::db::value::{ColumnType, SqlValue};

const MAX_NAME_LEN: usize = 256;
const MAX_EMAIL_LEN: usize = 256;

/// Matches DB constraint on `forum.users.username`
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]{1,64}$").expect("invalid username regex"));

/// One `@`, non-empty local part, dotted domain
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("invalid email regex")
});

pub const USERS: TableSchema = TableSchema {
    table: "forum.users",
    alias: "users",
    resource: "user",
    select: "id, name, username, email, created_at, updated_at, deleted, deleted_at",
    filterable: &[
        Column::new("id", ColumnType::Uuid),
        Column::new("name", ColumnType::Text),
        Column::new("username", ColumnType::Text),
        Column::new("email", ColumnType::Text),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp),
        Column::new("deleted", ColumnType::Bool),
        Column::new("deleted_at", ColumnType::Timestamp),
    ],
    sortable: &[
        "id",
        "name",
        "username",
        "email",
        "created_at",
        "updated_at",
        "deleted_at",
    ],
};

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for User {
    const SCHEMA: &'static TableSchema = &USERS;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// New user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub username: String,
    pub email: String,
}

impl Insertable for UserInput {
    type Entity = User;

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("username", self.username.as_str().into()),
            ("email", self.email.as_str().into()),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        validate_username(&self.username)?;
        validate_email(&self.email)
    }
}

/// Partial user update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Patchable for UserPatch {
    type Entity = User;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(name) = &self.name {
            set.push(("name", name.as_str().into()));
        }
        if let Some(username) = &self.username {
            set.push(("username", username.as_str().into()));
        }
        if let Some(email) = &self.email {
            set.push(("email", email.as_str().into()));
        }
        set
    }

    fn validate(&self) -> Result<(), ValidationError> {
        optional_text("name", self.name.as_deref(), MAX_NAME_LEN)?;
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Empty { field: "username" });
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidFormat {
            field: "username",
            reason: "must be 1-64 letters, digits, '_', '.' or '-'",
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_text("email", email, MAX_EMAIL_LEN)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must look like name@example.com",
        });
    }
    Ok(())
}
