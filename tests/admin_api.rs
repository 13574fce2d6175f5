//! End-to-end tests of the admin REST API over an in-memory database

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{login, register, send, test_app, EMAIL, PASSWORD};
use qss_admin::db::repositories::{
    AdminUserRepository, SessionTokenRepository, SqlxAdminUserRepository,
    SqlxSessionTokenRepository,
};
use qss_admin::services::password::verify_password;

fn post_body(slug: &str) -> serde_json::Value {
    json!({
        "title": "Hello world",
        "slug": slug,
        "content": "First post body",
        "tags": ["news", "rust"],
    })
}

fn service_body() -> serde_json::Value {
    json!({
        "title": "Cloud migration",
        "slug": "cloud-migration",
        "category": "Infrastructure",
        "summary": "Move workloads to the cloud",
        "description": "Assessment, planning and execution",
        "icon": "cloud",
        "features": ["Assessment", "Execution"],
    })
}

#[tokio::test]
async fn test_register_stores_verifiable_hash() {
    let (app, state) = test_app().await;

    let response = register(&app).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], EMAIL);
    assert_eq!(response.body["name"], "A B");
    assert!(response.body.get("passwordHash").is_none());

    let admin = SqlxAdminUserRepository::new(state.pool.clone())
        .find_by_email(EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(admin.password_hash, PASSWORD);
    assert!(verify_password(PASSWORD, &admin.password_hash).unwrap());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _) = test_app().await;
    register(&app).await;

    let response = register(&app).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_validation_issues() {
    let (app, _) = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/admin/register",
        None,
        Some(json!({ "email": "nope", "password": "short", "name": "" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Validation error");
    let issues = response.body["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 3);
    assert!(issues.iter().any(|i| i["path"] == json!(["email"])));
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let (app, _) = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!("not an object")),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["issues"][0]["code"], "invalid_body");
}

#[tokio::test]
async fn test_trailing_whitespace_in_path_is_ignored() {
    let (app, _) = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/admin/register%20",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD, "name": "A B" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_creates_exactly_one_session() {
    let (app, state) = test_app().await;
    register(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["token"].as_str().unwrap().split('.').count() == 3);
    assert_eq!(response.body["user"]["email"], EMAIL);
    assert_eq!(response.body["user"]["roles"], json!(["admin"]));
    assert_eq!(response.body["user"]["permissions"], json!(["admin:access"]));

    let admin_id = response.body["user"]["id"].as_str().unwrap();
    let sessions = SqlxSessionTokenRepository::new(state.pool.clone());
    assert_eq!(sessions.count_by_admin(admin_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_login_creates_no_session() {
    let (app, state) = test_app().await;
    let admin_id = register(&app).await.body["id"].as_str().unwrap().to_string();

    for body in [
        json!({ "email": EMAIL, "password": "WrongPass!" }),
        json!({ "email": "x@y.com", "password": PASSWORD }),
    ] {
        let response = send(&app, Method::POST, "/api/admin/login", None, Some(body)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "Invalid credentials");
    }

    let sessions = SqlxSessionTokenRepository::new(state.pool.clone());
    assert_eq!(sessions.count_by_admin(&admin_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_logout_deletes_session() {
    let (app, state) = test_app().await;
    let token = login(&app).await;

    let ctx = state.auth_service.authenticate(&token).await.unwrap();

    let response = send(&app, Method::POST, "/api/admin/logout", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged out");

    let sessions = SqlxSessionTokenRepository::new(state.pool.clone());
    assert!(sessions.find_by_id(&ctx.session_id).await.unwrap().is_none());

    // The token no longer authorizes anything
    let response = send(&app, Method::GET, "/api/admin/posts", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Session expired");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = test_app().await;

    let response = send(&app, Method::GET, "/api/admin/posts", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Authentication required");

    let response = send(&app, Method::GET, "/api/admin/posts", Some("garbage"), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid token");

    let response = send(
        &app,
        Method::POST,
        "/api/admin/services",
        None,
        Some(service_body()),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_example_scenario() {
    let (app, _) = test_app().await;

    let registered = register(&app).await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["email"], "a@b.com");
    assert_eq!(registered.body["name"], "A B");

    let token = login(&app).await;
    let response = send(&app, Method::GET, "/api/admin/posts", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_post_lifecycle() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let created = send(
        &app,
        Method::POST,
        "/api/admin/posts",
        Some(&token),
        Some(post_body("hello-world")),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["tags"], json!(["news", "rust"]));
    assert!(created.body["createdById"].is_string());
    let id = created.body["id"].as_str().unwrap().to_string();

    let duplicate = send(
        &app,
        Method::POST,
        "/api/admin/posts",
        Some(&token),
        Some(post_body("hello-world")),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert!(duplicate.body["message"]
        .as_str()
        .unwrap()
        .contains("Unique constraint failed"));
    assert_eq!(duplicate.body["meta"]["target"], json!(["slug"]));

    let by_slug = send(
        &app,
        Method::GET,
        "/api/admin/posts?slug=hello-world",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(by_slug.body.as_array().unwrap().len(), 1);

    let blank_slug = send(&app, Method::GET, "/api/admin/posts?slug=", Some(&token), None).await;
    assert_eq!(blank_slug.status, StatusCode::OK);
    assert_eq!(blank_slug.body.as_array().unwrap().len(), 1);

    let fetched = send(&app, Method::GET, &format!("/api/admin/posts/{}", id), Some(&token), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["slug"], "hello-world");

    let updated = send(
        &app,
        Method::PUT,
        &format!("/api/admin/posts/{}", id),
        Some(&token),
        Some(json!({ "title": "Renamed", "published": true, "image": null })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Renamed");
    assert_eq!(updated.body["published"], true);

    let deleted = send(&app, Method::DELETE, &format!("/api/admin/posts/{}", id), Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let list = send(&app, Method::GET, "/api/admin/posts", Some(&token), None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_missing_post_messages() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let get = send(&app, Method::GET, "/api/admin/posts/missing", Some(&token), None).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert_eq!(get.body["message"], "Post not found");

    let put = send(
        &app,
        Method::PUT,
        "/api/admin/posts/missing",
        Some(&token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.body["message"], "Record not found");

    // Body validation runs before the row lookup
    let invalid_put = send(
        &app,
        Method::PUT,
        "/api/admin/posts/missing",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(invalid_put.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid_put.body["issues"][0]["path"], json!(["title"]));

    let delete = send(&app, Method::DELETE, "/api/admin/posts/missing", Some(&token), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.body["message"], "Record not found");
}

#[tokio::test]
async fn test_service_lifecycle() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let created = send(
        &app,
        Method::POST,
        "/api/admin/services",
        Some(&token),
        Some(service_body()),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["isActive"], true);
    let id = created.body["id"].as_str().unwrap().to_string();

    // Reads are public
    let listed = send(&app, Method::GET, "/api/admin/services", None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let updated = send(
        &app,
        Method::PUT,
        &format!("/api/admin/services/{}", id),
        Some(&token),
        Some(json!({ "isActive": false, "features": ["Only one"] })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["isActive"], false);
    assert_eq!(updated.body["features"], json!(["Only one"]));

    let invalid = send(
        &app,
        Method::PUT,
        &format!("/api/admin/services/{}", id),
        Some(&token),
        Some(json!({ "features": [] })),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let deleted = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/services/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_missing_service_messages() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let get = send(&app, Method::GET, "/api/admin/services/missing", None, None).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert_eq!(get.body["message"], "Service not found");

    let put = send(
        &app,
        Method::PUT,
        "/api/admin/services/missing",
        Some(&token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.body["message"], "Record not found");

    // Body validation runs before the row lookup
    let invalid_put = send(
        &app,
        Method::PUT,
        "/api/admin/services/missing",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(invalid_put.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid_put.body["issues"][0]["path"], json!(["title"]));

    let delete = send(
        &app,
        Method::DELETE,
        "/api/admin/services/missing",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.body["message"], "Record not found");
}

#[tokio::test]
async fn test_unknown_routes_return_json_404() {
    let (app, _) = test_app().await;

    for uri in ["/nope", "/api/admin/nope", "/api/blog/posts/a/b"] {
        let response = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(response.body, json!({ "message": "Route not found" }));
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
    }
}

#[tokio::test]
async fn test_public_blog_shows_published_posts_only() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let mut draft = post_body("draft");
    draft["published"] = json!(false);
    send(&app, Method::POST, "/api/admin/posts", Some(&token), Some(draft)).await;

    let mut live = post_body("live");
    live["published"] = json!(true);
    live["featured"] = json!(true);
    live["publishedAt"] = json!("2024-05-01");
    send(&app, Method::POST, "/api/admin/posts", Some(&token), Some(live)).await;

    let listed = send(&app, Method::GET, "/api/blog/posts", None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let posts = listed.body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "live");

    let featured = send(&app, Method::GET, "/api/blog/posts?featured=true", None, None).await;
    assert_eq!(featured.body.as_array().unwrap().len(), 1);

    let bad_query = send(&app, Method::GET, "/api/blog/posts?featured=abc", None, None).await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query.content_type.as_deref(), Some("application/json"));
    assert_eq!(bad_query.body["message"], "Validation error");
    assert_eq!(bad_query.body["issues"][0]["code"], "invalid_query");

    let found = send(&app, Method::GET, "/api/blog/posts/live", None, None).await;
    assert_eq!(found.status, StatusCode::OK);

    let hidden = send(&app, Method::GET, "/api/blog/posts/draft", None, None).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
    assert_eq!(hidden.body["message"], "Post not found");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app().await;
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}
