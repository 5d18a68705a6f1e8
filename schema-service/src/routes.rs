//! Route table.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Routes accept both the bare and the trailing-slash form of each path.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/db-credentials", post(handlers::create_credentials))
        .route("/db-credentials/", post(handlers::create_credentials))
        .route("/db-schema", get(handlers::get_schema))
        .route("/db-schema/", get(handlers::get_schema))
        .route("/search-table", get(handlers::search_table))
        .route("/search-table/", get(handlers::search_table))
        .route("/api/health", get(handlers::health_check))
}
