//! Custom error types for the messenger service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the messenger service
///
/// This is the only error type handlers return; [`IntoResponse`] below is
/// the single place where a failure kind becomes a status code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad username/password pair
    #[error("Invalid username/password")]
    Authentication,

    /// Username already registered
    #[error("Username already taken")]
    DuplicateUser,

    /// Missing or invalid session token
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid session, wrong identity for the resource
    #[error("Forbidden")]
    Forbidden,

    /// Resource absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    /// Report a forbidden access to `what` as if it did not exist.
    ///
    /// Message routes use this so a caller who is not a party to a message
    /// cannot tell it apart from a missing one.
    pub fn conceal(self, what: &'static str) -> Self {
        match self {
            ApiError::Forbidden => ApiError::NotFound(what),
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Authentication | ApiError::DuplicateUser => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
