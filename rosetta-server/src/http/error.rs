//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{ConstraintKind, DbError};
use crate::models::{FilterError, ValidationError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Filter or sort parameters rejected (400)
    InvalidFilter(FilterError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate of an existing unique value (409)
    Conflict { message: String },

    /// Other integrity constraint failure (400)
    Constraint { kind: ConstraintKind, message: String },

    /// Database unreachable (503, logged)
    Unavailable(DbError),

    /// Database call exceeded its bound (504)
    Timeout(Duration),

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::InvalidFilter(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "invalid_filter",
                    "message": e.to_string()
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Constraint { kind, message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "constraint_violation",
                    "message": format!("{} constraint violated: {}", kind, message)
                }),
            ),
            Self::Unavailable(e) => {
                tracing::error!("Database unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "unavailable",
                        "message": "the database is currently unavailable"
                    }),
                )
            }
            Self::Timeout(after) => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({
                    "error": "timeout",
                    "message": format!("operation timed out after {} seconds", after.as_secs_f64())
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        Self::InvalidFilter(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::InvalidFilter(e) => Self::InvalidFilter(e),
            DbError::Invalid(e) => Self::Validation(e),
            DbError::ConstraintViolation {
                kind: ConstraintKind::Unique,
                message,
                ..
            } => Self::Conflict { message },
            DbError::ConstraintViolation { kind, message, .. } => Self::Constraint { kind, message },
            DbError::Timeout(after) => Self::Timeout(after),
            DbError::StoreUnavailable(_) => Self::Unavailable(e),
            DbError::Query(_) => Self::Database(e),
        }
    }
}
