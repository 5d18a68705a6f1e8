//! Shared building blocks for the schema introspection service.
//!
//! Holds the pieces every handler touches: configuration, the error
//! taxonomy and its HTTP mapping, request/response models, the validating
//! JSON extractor and the request-id middleware.

pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;

pub use errors::{AppError, AppResult, ConnectionError};
