//! API response body types.
//!
//! Success bodies are endpoint-specific; every failure shares [`ErrorResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,

    /// Error code for client handling (e.g., "MISSING_PARAMETER", "TABLE_NOT_FOUND").
    pub code: String,
}

impl ErrorResponse {
    /// Creates an error body from a code and a message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
    /// Number of registered credential records.
    pub credentials: usize,
}

impl HealthResponse {
    /// Creates a healthy response for the named service.
    pub fn healthy(service: impl Into<String>, version: impl Into<String>, credentials: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
            timestamp: Utc::now(),
            credentials,
        }
    }
}
