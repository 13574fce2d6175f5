//! API middleware
//!
//! Contains:
//! - Shared application state
//! - `ApiError`, the single translator from service errors to HTTP responses
//! - Bearer token authentication (`require_auth`)
//! - Trailing whitespace trimming of request paths
//! - The JSON 404 fallback

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, uri::PathAndQuery, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::{
    SqlxAdminUserRepository, SqlxBlogPostRepository, SqlxServiceRepository,
    SqlxSessionTokenRepository,
};
use crate::db::{DbError, DynDatabasePool};
use crate::models::AdminContext;
use crate::services::{
    AuthService, AuthServiceError, BlogService, CatalogService, ContentServiceError, TokenSigner,
};
use crate::validation::{ValidationErrors, ValidationIssue};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub blog_service: Arc<BlogService>,
    pub catalog_service: Arc<CatalogService>,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool
    pub fn new(pool: DynDatabasePool, auth: &AuthConfig) -> Self {
        let signer = TokenSigner::new(
            auth.secret_or_default(),
            chrono::Duration::minutes(auth.token_ttl_minutes),
        );
        let auth_service = AuthService::new(
            SqlxAdminUserRepository::boxed(pool.clone()),
            SqlxSessionTokenRepository::boxed(pool.clone()),
            signer,
        )
        .with_session_ttl(chrono::Duration::hours(auth.session_ttl_hours));

        Self {
            auth_service: Arc::new(auth_service),
            blog_service: Arc::new(BlogService::new(SqlxBlogPostRepository::boxed(pool.clone()))),
            catalog_service: Arc::new(CatalogService::new(SqlxServiceRepository::boxed(
                pool.clone(),
            ))),
            pool,
        }
    }
}

/// Admin attached to the request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub AdminContext);

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
///
/// Serializes as `{ message, issues?, meta? }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<ValidationIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            issues: None,
            meta: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            issues: Some(errors.issues),
            ..Self::new(StatusCode::BAD_REQUEST, "Validation error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { target, message } => Self {
                meta: Some(serde_json::json!({ "target": target })),
                ..Self::conflict(message)
            },
            DbError::NotFound => Self::not_found("Record not found"),
            DbError::Query(e) => {
                tracing::error!(error = ?e, "Database error");
                Self::internal_error(e.to_string())
            }
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Validation(errors) => Self::validation(errors),
            AuthServiceError::EmailTaken => Self::conflict(err.to_string()),
            AuthServiceError::InvalidCredentials
            | AuthServiceError::InvalidToken
            | AuthServiceError::SessionExpired => Self::unauthorized(err.to_string()),
            AuthServiceError::Internal(e) => {
                tracing::error!(error = ?e, "Auth service error");
                Self::internal_error(e.to_string())
            }
        }
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(err: ContentServiceError) -> Self {
        match err {
            ContentServiceError::Validation(errors) => Self::validation(errors),
            ContentServiceError::PostNotFound | ContentServiceError::ServiceNotFound => {
                Self::not_found(err.to_string())
            }
            ContentServiceError::Db(e) => e.into(),
        }
    }
}

/// Read the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Rejects requests without a valid bearer token and stores the resolved
/// [`AuthenticatedAdmin`] in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?
        .to_string();

    let admin = state.auth_service.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedAdmin(admin));
    Ok(next.run(request).await)
}

const ENCODED_WHITESPACE: [&str; 4] = ["%20", "%09", "%0a", "%0d"];

/// Remove trailing whitespace, literal or percent-encoded, from a path.
///
/// Returns `None` when the path is already clean.
pub fn trim_trailing_whitespace(path: &str) -> Option<String> {
    let mut end = path.len();
    loop {
        let current = &path[..end];
        if let Some(last) = current.chars().last().filter(|c| c.is_whitespace()) {
            end -= last.len_utf8();
            continue;
        }
        let encoded = current.len() >= 3
            && current.is_char_boundary(current.len() - 3)
            && ENCODED_WHITESPACE
                .iter()
                .any(|seq| current[current.len() - 3..].eq_ignore_ascii_case(seq));
        if encoded {
            end -= 3;
            continue;
        }
        break;
    }

    if end == path.len() {
        return None;
    }
    let trimmed = &path[..end];
    Some(if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() })
}

/// Middleware rewriting the request path before routing
pub async fn trim_path_middleware(mut request: Request, next: Next) -> Response {
    if let Some(path) = trim_trailing_whitespace(request.uri().path()) {
        let path_and_query = match request.uri().query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        let mut parts = request.uri().clone().into_parts();
        match path_and_query.parse::<PathAndQuery>() {
            Ok(pq) => {
                parts.path_and_query = Some(pq);
                match Uri::from_parts(parts) {
                    Ok(uri) => {
                        tracing::debug!(from = %request.uri(), to = %uri, "Trimmed request path");
                        *request.uri_mut() = uri;
                    }
                    Err(e) => tracing::debug!(error = %e, "Could not rebuild trimmed URI"),
                }
            }
            Err(e) => tracing::debug!(error = %e, "Could not parse trimmed path"),
        }
    }

    next.run(request).await
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
