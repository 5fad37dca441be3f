// src/routes/mod.rs

use axum::http::StatusCode;

use crate::workflow::{FieldError, TargetStatus};

pub mod approvals;
pub mod health;
pub mod master_data;
pub mod targets;

pub type ApiError = (StatusCode, String);

// Common error mappers
pub fn internal_error<E: std::fmt::Display>(e: E) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
}

pub fn bad_request(e: &FieldError) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

pub fn conflict(message: impl Into<String>) -> ApiError {
    (StatusCode::CONFLICT, message.into())
}

pub fn not_found_or_internal(e: sqlx::Error) -> ApiError {
    match e {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
        other => internal_error(other),
    }
}

/// Stored code of a persisted status.
pub(crate) fn status_code(status: TargetStatus) -> &'static str {
    status.code().unwrap_or("T01")
}
