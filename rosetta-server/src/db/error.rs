//! Database error taxonomy
//!
//! Store errors are classified once, here, so callers can match on what
//! went wrong instead of inspecting SQLSTATE codes.

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::models::{FilterError, ValidationError};

/// Kind of integrity constraint the store rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Check,
    Restrict,
}

impl ConstraintKind {
    /// Map a PostgreSQL SQLSTATE to a constraint kind.
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            "23503" => Some(Self::ForeignKey),
            "23505" => Some(Self::Unique),
            "23502" => Some(Self::NotNull),
            "23514" => Some(Self::Check),
            "23001" => Some(Self::Restrict),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ForeignKey => "foreign key",
            Self::Unique => "unique",
            Self::NotNull => "not null",
            Self::Check => "check",
            Self::Restrict => "restrict",
        };
        f.write_str(s)
    }
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{kind} constraint violated: {message}")]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: Option<String>,
        message: String,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("database unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Query(#[source] sqlx::Error),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let kind = db.code().as_deref().and_then(ConstraintKind::from_sqlstate);
            if let Some(kind) = kind {
                return Self::ConstraintViolation {
                    kind,
                    constraint: db.constraint().map(str::to_owned),
                    message: db.message().to_owned(),
                };
            }
        }

        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::StoreUnavailable(err),
            other => Self::Query(other),
        }
    }
}
