//! Admin blog post endpoints (all authenticated)
//!
//! - GET /api/admin/posts?slug= - List posts, optionally by slug
//! - POST /api/admin/posts - Create a post
//! - GET /api/admin/posts/{id} - Get a post
//! - PUT /api/admin/posts/{id} - Update a post
//! - DELETE /api/admin/posts/{id} - Delete a post

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::extract::{JsonBody, QueryParams};
use super::middleware::{ApiError, AppState, AuthenticatedAdmin};
use crate::models::{BlogPost, CreateBlogPostInput, PostQuery, UpdateBlogPostInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

async fn list_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PostQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.blog_service.list(&query).await?))
}

async fn create_post(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    JsonBody(input): JsonBody<CreateBlogPostInput>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let post = state.blog_service.create(input, Some(admin.id)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.get(&id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateBlogPostInput>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.update(&id, input).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
