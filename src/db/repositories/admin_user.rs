//! Admin user repository
//!
//! This module provides:
//! - `AdminUserRepository` trait defining the interface for admin account access
//! - `SqlxAdminUserRepository` implementing the trait for SQLite and MySQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{with_pool, DbResult, DynDatabasePool};
use crate::models::AdminUser;

/// Admin user repository trait
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// Insert a new admin; a taken email yields `DbError::UniqueViolation`
    async fn create(&self, admin: &AdminUser) -> DbResult<AdminUser>;

    async fn find_by_id(&self, id: &str) -> DbResult<Option<AdminUser>>;

    async fn find_by_email(&self, email: &str) -> DbResult<Option<AdminUser>>;

    /// Total number of admins
    async fn count(&self) -> DbResult<i64>;
}

/// SQLx-based admin user repository implementation
pub struct SqlxAdminUserRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminUserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: String,
    email: String,
    password_hash: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdminUserRow> for AdminUser {
    fn from(row: AdminUserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_ADMIN: &str =
    "SELECT id, email, password_hash, name, created_at, updated_at FROM admin_users";

#[async_trait]
impl AdminUserRepository for SqlxAdminUserRepository {
    async fn create(&self, admin: &AdminUser) -> DbResult<AdminUser> {
        const SQL: &str = r#"
            INSERT INTO admin_users (id, email, password_hash, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;

        with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&admin.id)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(&admin.name)
            .bind(admin.created_at)
            .bind(admin.updated_at)
            .execute(p)
            .await
            .map(|_| ()))?;

        Ok(admin.clone())
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<AdminUser>> {
        let sql = format!("{} WHERE id = ?", SELECT_ADMIN);
        let row = with_pool!(self.pool, |p| sqlx::query_as::<_, AdminUserRow>(&sql)
            .bind(id)
            .fetch_optional(p)
            .await)?;
        Ok(row.map(AdminUser::from))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<AdminUser>> {
        let sql = format!("{} WHERE email = ?", SELECT_ADMIN);
        let row = with_pool!(self.pool, |p| sqlx::query_as::<_, AdminUserRow>(&sql)
            .bind(email)
            .fetch_optional(p)
            .await)?;
        Ok(row.map(AdminUser::from))
    }

    async fn count(&self) -> DbResult<i64> {
        const SQL: &str = "SELECT COUNT(*) FROM admin_users";
        let count: i64 = with_pool!(self.pool, |p| sqlx::query_scalar(SQL).fetch_one(p).await)?;
        Ok(count)
    }
}
