//! HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use common::errors::{AppError, AppResult};
use common::extract::ValidatedJson;
use common::models::credentials::{CreateCredentialsRequest, CredentialItem};
use common::models::schema::{
    DatabaseSchemaResponse, SchemaQuery, TableSearchQuery, TableSearchResponse,
};
use common::response::{ErrorResponse, HealthResponse};

use crate::service::{CredentialService, SchemaService};
use crate::state::AppState;

const SERVICE_NAME: &str = "schema-service";

/// Register connection credentials for a database
#[utoipa::path(
    post,
    path = "/db-credentials/",
    tag = "credentials",
    request_body = CreateCredentialsRequest,
    responses(
        (status = 201, description = "Credentials registered", body = CredentialItem),
        (status = 400, description = "Malformed or invalid body", body = ErrorResponse),
        (status = 409, description = "db_name already registered", body = ErrorResponse)
    )
)]
pub async fn create_credentials(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateCredentialsRequest>,
) -> Result<(StatusCode, Json<CredentialItem>), AppError> {
    let service = CredentialService::new(state.store);
    let item = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Fetch every table and column of a registered database
#[utoipa::path(
    get,
    path = "/db-schema",
    tag = "schema",
    params(SchemaQuery),
    responses(
        (status = 200, description = "Full schema of the default schema", body = DatabaseSchemaResponse),
        (status = 400, description = "db_name missing", body = ErrorResponse),
        (status = 404, description = "Unknown db_name", body = ErrorResponse),
        (status = 500, description = "Connection or catalog query failure", body = ErrorResponse)
    )
)]
pub async fn get_schema(
    State(state): State<AppState>,
    Query(params): Query<SchemaQuery>,
) -> Result<Json<DatabaseSchemaResponse>, AppError> {
    let db_name = required(params.db_name.as_deref())
        .ok_or_else(|| AppError::MissingParameter("Database name is required.".into()))?;

    let service = SchemaService::new(state.store, state.connector);
    let data = service.fetch_schema(db_name).await?;
    Ok(Json(data))
}

/// Check whether a table exists and describe its columns
#[utoipa::path(
    get,
    path = "/search-table",
    tag = "schema",
    params(TableSearchQuery),
    responses(
        (status = 200, description = "Table exists", body = TableSearchResponse),
        (status = 400, description = "db_name or table_name missing", body = ErrorResponse),
        (status = 404, description = "Unknown db_name or table does not exist", body = ErrorResponse),
        (status = 500, description = "Connection or catalog query failure", body = ErrorResponse)
    )
)]
pub async fn search_table(
    State(state): State<AppState>,
    Query(params): Query<TableSearchQuery>,
) -> Result<Json<TableSearchResponse>, AppError> {
    let (db_name, table_name) = match (
        required(params.db_name.as_deref()),
        required(params.table_name.as_deref()),
    ) {
        (Some(db_name), Some(table_name)) => (db_name, table_name),
        _ => {
            return Err(AppError::MissingParameter(
                "Database name and table name are required.".into(),
            ))
        }
    };

    let service = SchemaService::new(state.store, state.connector);
    let data = service.search_table(db_name, table_name).await?;
    Ok(Json(data))
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
        (status = 500, description = "Credential store unavailable", body = ErrorResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let credentials = state.store.count().await?;
    Ok(Json(HealthResponse::healthy(
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        credentials,
    )))
}

/// Treats absent and blank values alike.
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
