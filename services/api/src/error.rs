//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{"error": "<message>"}`; internal failures are logged and replaced by a
//! generic message.

use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reading_tracker_core::{ports::PortError, ValidationError};
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A submission that failed a presence or positivity check.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request axum could not decode: wrong content type, malformed path id.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Wrong username or password, or a stale reset token.
    #[error("{0}")]
    Unauthorized(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Port(PortError::Invalid(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Port(PortError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            Self::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Rejected { status, message } => (*status, message.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, please try again.".to_string(),
            ),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
