//! Error types for filmqa.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Request errors
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Spreadsheet errors
    #[error("Template not available: {0}")]
    Template(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 404
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 409
            Self::AlreadyExists(_) | Self::Conflict(_) => StatusCode::CONFLICT,

            // 400
            Self::MissingParameter(_) | Self::Validation(_) | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }

            // 500
            Self::Database(_)
            | Self::Template(_)
            | Self::Workbook(_)
            | Self::Internal(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Conflict(_) => "CONFLICT",
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Template(_) => "TEMPLATE_ERROR",
            Self::Workbook(_) => "WORKBOOK_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Other(_) => "UNKNOWN_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        } else {
            tracing::debug!(code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<umya_spreadsheet::XlsxError> for Error {
    fn from(err: umya_spreadsheet::XlsxError) -> Self {
        Self::Workbook(err.to_string())
    }
}
