//! Blog post repository
//!
//! This module provides:
//! - `BlogPostRepository` trait defining the interface for post data access
//! - `SqlxBlogPostRepository` implementing the trait for SQLite and MySQL
//!
//! Tags are stored as a JSON array in a TEXT column.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{with_pool, DbError, DbResult, DynDatabasePool};
use crate::models::BlogPost;

/// Blog post repository trait
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// Insert a post; a taken slug yields `DbError::UniqueViolation`
    async fn create(&self, post: &BlogPost) -> DbResult<BlogPost>;

    async fn find_by_id(&self, id: &str) -> DbResult<Option<BlogPost>>;

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<BlogPost>>;

    /// All posts, newest first
    async fn list(&self) -> DbResult<Vec<BlogPost>>;

    /// Published posts ordered by publication date, newest first
    async fn list_published(&self, featured_only: bool) -> DbResult<Vec<BlogPost>>;

    /// Overwrite a stored post; `DbError::NotFound` when the id is unknown
    async fn update(&self, post: &BlogPost) -> DbResult<BlogPost>;

    /// Delete by id; `DbError::NotFound` when the id is unknown
    async fn delete(&self, id: &str) -> DbResult<()>;
}

/// SQLx-based blog post repository implementation
pub struct SqlxBlogPostRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogPostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_many(&self, sql: &str) -> DbResult<Vec<BlogPost>> {
        let rows = with_pool!(self.pool, |p| sqlx::query_as::<_, BlogPostRow>(sql)
            .fetch_all(p)
            .await)?;
        rows.into_iter().map(BlogPost::try_from).collect()
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> DbResult<Option<BlogPost>> {
        let sql = format!("{} WHERE {} = ?", SELECT_POST, column);
        let row = with_pool!(self.pool, |p| sqlx::query_as::<_, BlogPostRow>(&sql)
            .bind(value)
            .fetch_optional(p)
            .await)?;
        row.map(BlogPost::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct BlogPostRow {
    id: String,
    title: String,
    slug: String,
    content: String,
    description: Option<String>,
    category: Option<String>,
    author: Option<String>,
    read_time: Option<String>,
    published: bool,
    featured: bool,
    published_at: Option<DateTime<Utc>>,
    image: Option<String>,
    tags: String,
    created_by_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BlogPostRow> for BlogPost {
    type Error = DbError;

    fn try_from(row: BlogPostRow) -> Result<Self, Self::Error> {
        let tags = decode_list(&row.tags)
            .with_context(|| format!("Invalid tags stored for post {}", row.id))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            description: row.description,
            category: row.category,
            author: row.author,
            read_time: row.read_time,
            published: row.published,
            featured: row.featured,
            published_at: row.published_at,
            image: row.image,
            tags,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Decode a JSON string list column; blank means empty.
pub(crate) fn decode_list(raw: &str) -> serde_json::Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}

/// Encode a string list for a JSON column
pub(crate) fn encode_list(items: &[String]) -> DbResult<String> {
    serde_json::to_string(items)
        .context("Failed to encode list column")
        .map_err(DbError::from)
}

const SELECT_POST: &str = r#"
    SELECT id, title, slug, content, description, category, author, read_time,
           published, featured, published_at, image, tags, created_by_id,
           created_at, updated_at
    FROM blog_posts
"#;

#[async_trait]
impl BlogPostRepository for SqlxBlogPostRepository {
    async fn create(&self, post: &BlogPost) -> DbResult<BlogPost> {
        const SQL: &str = r#"
            INSERT INTO blog_posts (id, title, slug, content, description, category, author,
                                    read_time, published, featured, published_at, image, tags,
                                    created_by_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;
        let tags = encode_list(&post.tags)?;

        with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&post.id)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(&post.description)
            .bind(&post.category)
            .bind(&post.author)
            .bind(&post.read_time)
            .bind(post.published)
            .bind(post.featured)
            .bind(post.published_at)
            .bind(&post.image)
            .bind(&tags)
            .bind(&post.created_by_id)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(p)
            .await
            .map(|_| ()))?;

        Ok(post.clone())
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<BlogPost>> {
        self.fetch_one_by("id", id).await
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<BlogPost>> {
        self.fetch_one_by("slug", slug).await
    }

    async fn list(&self) -> DbResult<Vec<BlogPost>> {
        let sql = format!("{} ORDER BY created_at DESC", SELECT_POST);
        self.fetch_many(&sql).await
    }

    async fn list_published(&self, featured_only: bool) -> DbResult<Vec<BlogPost>> {
        let filter = if featured_only {
            "WHERE published = TRUE AND featured = TRUE"
        } else {
            "WHERE published = TRUE"
        };
        let sql = format!(
            "{} {} ORDER BY published_at DESC, created_at DESC",
            SELECT_POST, filter
        );
        self.fetch_many(&sql).await
    }

    async fn update(&self, post: &BlogPost) -> DbResult<BlogPost> {
        const SQL: &str = r#"
            UPDATE blog_posts
            SET title = ?, slug = ?, content = ?, description = ?, category = ?, author = ?,
                read_time = ?, published = ?, featured = ?, published_at = ?, image = ?,
                tags = ?, updated_at = ?
            WHERE id = ?
        "#;
        let tags = encode_list(&post.tags)?;

        let affected = with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(&post.description)
            .bind(&post.category)
            .bind(&post.author)
            .bind(&post.read_time)
            .bind(post.published)
            .bind(post.featured)
            .bind(post.published_at)
            .bind(&post.image)
            .bind(&tags)
            .bind(post.updated_at)
            .bind(&post.id)
            .execute(p)
            .await
            .map(|r| r.rows_affected()))?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(post.clone())
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        const SQL: &str = "DELETE FROM blog_posts WHERE id = ?";
        let affected = with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(id)
            .execute(p)
            .await
            .map(|r| r.rows_affected()))?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateBlogPostInput;
    use chrono::Duration;

    async fn setup_test_repo() -> SqlxBlogPostRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxBlogPostRepository::new(pool)
    }

    fn post(slug: &str) -> BlogPost {
        BlogPost::from_input(
            CreateBlogPostInput {
                title: format!("Post {}", slug),
                slug: slug.to_string(),
                content: "Body".to_string(),
                tags: vec!["rust".to_string(), "web".to_string()],
                ..Default::default()
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = setup_test_repo().await;
        let created = repo.create(&post("first-post")).await.unwrap();

        let by_id = repo.find_by_id(&created.id).await.unwrap().expect("by id");
        assert_eq!(by_id.slug, "first-post");
        assert_eq!(by_id.tags, vec!["rust".to_string(), "web".to_string()]);
        assert!(!by_id.published);

        let by_slug = repo.find_by_slug("first-post").await.unwrap().expect("by slug");
        assert_eq!(by_slug.id, created.id);
        assert!(repo.find_by_slug("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let repo = setup_test_repo().await;
        repo.create(&post("same-slug")).await.unwrap();

        let err = repo.create(&post("same-slug")).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("Unique constraint failed"));
        assert!(err.to_string().contains("slug"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test_repo().await;
        let mut older = post("older");
        older.created_at = Utc::now() - Duration::days(1);
        repo.create(&older).await.unwrap();
        repo.create(&post("newer")).await.unwrap();

        let slugs: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["newer".to_string(), "older".to_string()]);
    }

    #[tokio::test]
    async fn test_list_published() {
        let repo = setup_test_repo().await;
        repo.create(&post("draft")).await.unwrap();

        let mut published = post("published");
        published.published = true;
        published.published_at = Some(Utc::now() - Duration::days(2));
        repo.create(&published).await.unwrap();

        let mut featured = post("featured");
        featured.published = true;
        featured.featured = true;
        featured.published_at = Some(Utc::now());
        repo.create(&featured).await.unwrap();

        let all: Vec<String> = repo
            .list_published(false)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(all, vec!["featured".to_string(), "published".to_string()]);

        let featured_only = repo.list_published(true).await.unwrap();
        assert_eq!(featured_only.len(), 1);
        assert_eq!(featured_only[0].slug, "featured");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut created = repo.create(&post("editable")).await.unwrap();

        created.title = "Edited".to_string();
        created.image = Some("cover.png".to_string());
        repo.update(&created).await.unwrap();

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Edited");
        assert_eq!(found.image.as_deref(), Some("cover.png"));

        repo.delete(&created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let repo = setup_test_repo().await;
        let ghost = post("ghost");

        assert!(matches!(repo.update(&ghost).await, Err(DbError::NotFound)));
        assert!(matches!(repo.delete(&ghost.id).await, Err(DbError::NotFound)));
    }

    #[test]
    fn test_decode_list() {
        assert!(decode_list("").unwrap().is_empty());
        assert_eq!(decode_list(r#"["a","b"]"#).unwrap(), vec!["a", "b"]);
        assert!(decode_list("not json").is_err());
    }
}
