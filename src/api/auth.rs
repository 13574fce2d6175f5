//! Admin authentication endpoints
//!
//! - POST /api/admin/register - Create an admin account
//! - POST /api/admin/login - Exchange credentials for an access token
//! - POST /api/admin/logout - End the current session (authenticated)

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::extract::JsonBody;
use super::middleware::{ApiError, AppState, AuthenticatedAdmin};
use super::responses::MessageResponse;
use crate::models::{AdminUser, LoginInput, RegisterInput};
use crate::services::LoginResponse;

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<(StatusCode, Json<AdminUser>), ApiError> {
    let admin = state.auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(state.auth_service.login(input).await?))
}

/// POST /logout
async fn logout(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.logout(&admin.session_id).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}
