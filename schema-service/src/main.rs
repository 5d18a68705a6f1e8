//! Schema introspection service
//!
//! Stores connection credentials for external relational databases and
//! answers questions about their structure:
//! - credential registration
//! - full schema listing per database
//! - single table lookup

mod catalog;
mod connector;
mod formatter;
mod handlers;
mod routes;
mod service;
mod state;
mod store;

#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "schema-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Schema Service API",
        version = "0.1.0",
        description = "Credential registry and schema introspection for external databases"
    ),
    paths(
        handlers::create_credentials,
        handlers::get_schema,
        handlers::search_table,
        handlers::health_check,
    ),
    components(schemas(
        common::models::CreateCredentialsRequest,
        common::models::CredentialItem,
        common::models::ColumnDescriptor,
        common::models::ColumnSummary,
        common::models::DatabaseSchemaResponse,
        common::models::TableSearchResponse,
        common::response::ErrorResponse,
        common::response::HealthResponse,
    )),
    tags(
        (name = "credentials", description = "Credential registration"),
        (name = "schema", description = "Schema introspection"),
        (name = "health", description = "Health check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Reads .env before the process environment
    let config = AppConfig::load_with_service(SERVICE_NAME);

    let state = AppState::new(config.clone())
        .await
        .context("failed to open the credential store (check CREDENTIAL_STORE_URL)")?;

    let app = create_router(state);

    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        store = %config.credential_store_url,
        "Starting service"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
