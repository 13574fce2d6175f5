//! Service listing repository

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::blog_post::{decode_list, encode_list};
use crate::db::{with_pool, DbError, DbResult, DynDatabasePool};
use crate::models::Service;

/// Service repository trait
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Insert a service; a taken slug yields `DbError::UniqueViolation`
    async fn create(&self, service: &Service) -> DbResult<Service>;

    async fn find_by_id(&self, id: &str) -> DbResult<Option<Service>>;

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Service>>;

    /// All services, newest first
    async fn list(&self) -> DbResult<Vec<Service>>;

    /// Overwrite a stored service; `DbError::NotFound` when the id is unknown
    async fn update(&self, service: &Service) -> DbResult<Service>;

    /// Delete by id; `DbError::NotFound` when the id is unknown
    async fn delete(&self, id: &str) -> DbResult<()>;
}

/// SQLx-based service repository implementation
pub struct SqlxServiceRepository {
    pool: DynDatabasePool,
}

impl SqlxServiceRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ServiceRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> DbResult<Option<Service>> {
        let sql = format!("{} WHERE {} = ?", SELECT_SERVICE, column);
        let row = with_pool!(self.pool, |p| sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(value)
            .fetch_optional(p)
            .await)?;
        row.map(Service::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: String,
    title: String,
    slug: String,
    category: String,
    summary: String,
    description: String,
    icon: String,
    features: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = DbError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let features = decode_list(&row.features)
            .with_context(|| format!("Invalid features stored for service {}", row.id))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            category: row.category,
            summary: row.summary,
            description: row.description,
            icon: row.icon,
            features,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_SERVICE: &str = r#"
    SELECT id, title, slug, category, summary, description, icon, features, is_active,
           created_at, updated_at
    FROM services
"#;

#[async_trait]
impl ServiceRepository for SqlxServiceRepository {
    async fn create(&self, service: &Service) -> DbResult<Service> {
        const SQL: &str = r#"
            INSERT INTO services (id, title, slug, category, summary, description, icon,
                                  features, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;
        let features = encode_list(&service.features)?;

        with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&service.id)
            .bind(&service.title)
            .bind(&service.slug)
            .bind(&service.category)
            .bind(&service.summary)
            .bind(&service.description)
            .bind(&service.icon)
            .bind(&features)
            .bind(service.is_active)
            .bind(service.created_at)
            .bind(service.updated_at)
            .execute(p)
            .await
            .map(|_| ()))?;

        Ok(service.clone())
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        self.fetch_one_by("id", id).await
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<Service>> {
        self.fetch_one_by("slug", slug).await
    }

    async fn list(&self) -> DbResult<Vec<Service>> {
        let sql = format!("{} ORDER BY created_at DESC", SELECT_SERVICE);
        let rows = with_pool!(self.pool, |p| sqlx::query_as::<_, ServiceRow>(&sql)
            .fetch_all(p)
            .await)?;
        rows.into_iter().map(Service::try_from).collect()
    }

    async fn update(&self, service: &Service) -> DbResult<Service> {
        const SQL: &str = r#"
            UPDATE services
            SET title = ?, slug = ?, category = ?, summary = ?, description = ?, icon = ?,
                features = ?, is_active = ?, updated_at = ?
            WHERE id = ?
        "#;
        let features = encode_list(&service.features)?;

        let affected = with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&service.title)
            .bind(&service.slug)
            .bind(&service.category)
            .bind(&service.summary)
            .bind(&service.description)
            .bind(&service.icon)
            .bind(&features)
            .bind(service.is_active)
            .bind(service.updated_at)
            .bind(&service.id)
            .execute(p)
            .await
            .map(|r| r.rows_affected()))?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(service.clone())
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        const SQL: &str = "DELETE FROM services WHERE id = ?";
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
