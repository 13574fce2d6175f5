//! API layer - HTTP handlers and routing
//!
//! - Admin auth endpoints under `/api/admin`
//! - Admin post and service endpoints under `/api/admin`
//! - Public blog endpoints under `/api/blog`
//! - Health check at `/health`
//!
//! Request paths are trimmed of trailing whitespace before routing, and any
//! unmatched request gets a JSON 404.

pub mod auth;
pub mod blog;
pub mod extract;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod services;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedAdmin};
use responses::HealthResponse;

/// Routes under `/api/admin`
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(posts::router())
        .merge(services::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .merge(auth::public_router())
        .merge(services::public_router())
        .merge(protected_routes)
}

/// CORS policy for the configured origins; `*` allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .nest("/api/admin", build_admin_router(state.clone()))
        .nest("/api/blog", blog::router())
        .fallback(middleware::route_not_found)
        .method_not_allowed_fallback(middleware::route_not_found)
        .with_state(state);

    // Layers on the outer router run before the inner router matches, so the
    // trimmed path is the one that gets routed.
    Router::new()
        .fallback_service(routes)
        .layer(axum_middleware::from_fn(middleware::trim_path_middleware))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// GET /health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.pool.ping().await.map_err(|e| {
        tracing::error!(error = ?e, "Health check failed");
        ApiError::internal_error(e.to_string())
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_lists_and_wildcard() {
        // Construction must not panic for either form
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&[
            "http://localhost:5173".to_string(),
            "https://example.com".to_string(),
        ]);
        let _ = cors_layer(&[]);
    }
}
