//! Error taxonomy shared by all handlers.
//!
//! Every failure the service can report is an [`AppError`]; the
//! [`IntoResponse`] impl is the single place where error kinds are mapped to
//! HTTP status codes, so the service layer stays framework-agnostic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorResponse;

/// Message returned when a table search targets a missing table.
pub const TABLE_NOT_FOUND_MESSAGE: &str = "Table does not exist.";

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Failure to reach or authenticate against a target database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("authentication failed for the target database")]
    AuthenticationFailed,

    #[error("target database host is unreachable")]
    HostUnreachable,

    #[error("target database does not exist")]
    DatabaseNotFound,

    #[error("timed out connecting to the target database")]
    Timeout,

    #[error("invalid connection parameters: {0}")]
    InvalidParameters(String),

    #[error("connection failed: {0}")]
    Unknown(String),
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required query parameter is absent or empty.
    #[error("{0}")]
    MissingParameter(String),

    /// Request body failed to parse or validate.
    #[error("validation error: {0}")]
    Validation(String),

    /// No credentials registered under the given database name.
    #[error("Database credentials not found: {0}")]
    CredentialsNotFound(String),

    /// The searched table is not present in the target catalog.
    #[error("{}", TABLE_NOT_FOUND_MESSAGE)]
    TableNotFound(String),

    /// Credentials for this database name are already registered.
    #[error("credentials already registered for database: {0}")]
    DuplicateCredentials(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A catalog query failed on the target database.
    #[error("catalog query failed: {0}")]
    Query(String),

    #[error("catalog query timed out")]
    QueryTimeout,

    /// The credential store backend failed.
    #[error("credential store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingParameter(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CredentialsNotFound(_) | AppError::TableNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateCredentials(_) => StatusCode::CONFLICT,
            AppError::Connection(_)
            | AppError::Query(_)
            | AppError::QueryTimeout
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingParameter(_) => "MISSING_PARAMETER",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::CredentialsNotFound(_) => "CREDENTIALS_NOT_FOUND",
            AppError::TableNotFound(_) => "TABLE_NOT_FOUND",
            AppError::DuplicateCredentials(_) => "DUPLICATE_CREDENTIALS",
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Query(_) => "QUERY_ERROR",
            AppError::QueryTimeout => "QUERY_TIMEOUT",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorResponse::new(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e.to_string())
    }
}
