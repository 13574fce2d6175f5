//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use qss_admin::{
    api::{build_router, AppState},
    config::AuthConfig,
    db::{create_test_pool, migrations},
};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "Str0ngPass!";

/// Fresh in-memory database with the full router on top
pub async fn test_app() -> (Router, AppState) {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(pool, &AuthConfig::default());
    let router = build_router(state.clone(), &["*".to_string()]);
    (router, state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };

    TestResponse {
        status,
        content_type,
        body,
    }
}

pub async fn register(app: &Router) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/admin/register",
        None,
        Some(serde_json::json!({ "email": EMAIL, "password": PASSWORD, "name": "A B" })),
    )
    .await
}

/// Register the default admin and return a bearer token
pub async fn login(app: &Router) -> String {
    register(app).await;
    let response = send(
        app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(serde_json::json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    response.body["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}
