//! Typed bind values
//!
//! Column values travel through the query engine as [`SqlValue`] so that
//! every value is bound as a parameter and never spliced into SQL text.
//! The `Option` inside each variant carries SQL `NULL` with its type.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Storage type of a filterable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Uuid,
    Text,
    Bool,
    Timestamp,
    Int,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Int => "int",
        }
    }
}

/// A single bindable value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
    Int(Option<i64>),
}

impl SqlValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Uuid(_) => ColumnType::Uuid,
            Self::Text(_) => ColumnType::Text,
            Self::Bool(_) => ColumnType::Bool,
            Self::Timestamp(_) => ColumnType::Timestamp,
            Self::Int(_) => ColumnType::Int,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Uuid(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Bool(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
        }
    }

    /// Append this value as a bound parameter.
    pub fn push_bind(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self.clone() {
            Self::Uuid(v) => qb.push_bind(v),
            Self::Text(v) => qb.push_bind(v),
            Self::Bool(v) => qb.push_bind(v),
            Self::Timestamp(v) => qb.push_bind(v),
            Self::Int(v) => qb.push_bind(v),
        };
    }
}

impl PartialOrd for SqlValue {
    /// Only non-null values of the same type are comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Uuid(Some(a)), Self::Uuid(Some(b))) => a.partial_cmp(b),
            (Self::Text(Some(a)), Self::Text(Some(b))) => a.partial_cmp(b),
            (Self::Bool(Some(a)), Self::Bool(Some(b))) => a.partial_cmp(b),
            (Self::Timestamp(Some(a)), Self::Timestamp(Some(b))) => a.partial_cmp(b),
            (Self::Int(Some(a)), Self::Int(Some(b))) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(Some(v))
    }
}

impl From<Option<Uuid>> for SqlValue {
    fn from(v: Option<Uuid>) -> Self {
        Self::Uuid(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_owned()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(Some(v))
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(Some(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(Some(v))
    }
}
