//! Blog post service
//!
//! Admin CRUD over posts plus the read-only published listing used by the
//! marketing site.

use std::sync::Arc;

use super::error::ContentServiceError;
use crate::db::repositories::BlogPostRepository;
use crate::db::DbError;
use crate::models::{BlogPost, CreateBlogPostInput, PostQuery, UpdateBlogPostInput};
use crate::validation::Validate;

/// Blog post service
pub struct BlogService {
    repo: Arc<dyn BlogPostRepository>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogPostRepository>) -> Self {
        Self { repo }
    }

    /// List posts, newest first. A slug filter yields zero or one post; a
    /// blank slug is no filter.
    pub async fn list(&self, query: &PostQuery) -> Result<Vec<BlogPost>, ContentServiceError> {
        if let Some(slug) = query.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            let post = self.repo.find_by_slug(slug).await?;
            return Ok(post.into_iter().collect());
        }
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<BlogPost, ContentServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ContentServiceError::PostNotFound)
    }

    /// Create a post attributed to `created_by_id`
    pub async fn create(
        &self,
        input: CreateBlogPostInput,
        created_by_id: Option<String>,
    ) -> Result<BlogPost, ContentServiceError> {
        input.validate()?;

        let post = BlogPost::from_input(input, created_by_id);
        let created = self.repo.create(&post).await?;
        tracing::info!(post_id = %created.id, slug = %created.slug, "Blog post created");
        Ok(created)
    }

    /// Apply a partial update. A missing id is `DbError::NotFound`.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateBlogPostInput,
    ) -> Result<BlogPost, ContentServiceError> {
        input.validate()?;

        let mut post = self.repo.find_by_id(id).await?.ok_or(DbError::NotFound)?;
        post.apply(input);

        let updated = self.repo.update(&post).await?;
        tracing::info!(post_id = %updated.id, "Blog post updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ContentServiceError> {
        self.repo.delete(id).await?;
        tracing::info!(post_id = %id, "Blog post deleted");
        Ok(())
    }

    /// Published posts for the public site
    pub async fn list_published(
        &self,
        featured_only: bool,
    ) -> Result<Vec<BlogPost>, ContentServiceError> {
        Ok(self.repo.list_published(featured_only).await?)
    }

    /// A published post by slug; drafts are reported as missing
    pub async fn get_published(&self, slug: &str) -> Result<BlogPost, ContentServiceError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .filter(|post| post.published)
            .ok_or(ContentServiceError::PostNotFound)
    }
}
