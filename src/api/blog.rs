//! Public blog endpoints for the marketing site
//!
//! - GET /api/blog/posts?featured=true - Published posts, newest first
//! - GET /api/blog/posts/{slug} - A published post

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::extract::QueryParams;
use super::middleware::{ApiError, AppState};
use crate::models::{BlogPost, PostQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_published))
        .route("/posts/{slug}", get(get_published))
}

async fn list_published(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PostQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let featured_only = query.featured.unwrap_or(false);
    Ok(Json(state.blog_service.list_published(featured_only).await?))
}

async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.get_published(&slug).await?))
}
