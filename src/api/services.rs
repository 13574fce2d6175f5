//! Service listing endpoints
//!
//! Reads are public; writes require authentication.
//!
//! - GET /api/admin/services?slug=
//! - GET /api/admin/services/{id}
//! - POST /api/admin/services
//! - PUT /api/admin/services/{id}
//! - DELETE /api/admin/services/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use super::extract::{JsonBody, QueryParams};
use super::middleware::{ApiError, AppState};
use crate::models::{CreateServiceInput, Service, ServiceQuery, UpdateServiceInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/services", post(create_service))
        .route("/services/{id}", put(update_service).delete(delete_service))
}

async fn list_services(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ServiceQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.catalog_service.list(&query).await?))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(state.catalog_service.get(&id).await?))
}

async fn create_service(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateServiceInput>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let service = state.catalog_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateServiceInput>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(state.catalog_service.update(&id, input).await?))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalog_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
