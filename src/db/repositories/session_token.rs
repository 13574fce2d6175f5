//! Session token repository
//!
//! Database operations for admin sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{with_pool, DbResult, DynDatabasePool};
use crate::models::SessionToken;

/// Session repository trait
#[async_trait]
pub trait SessionTokenRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &SessionToken) -> DbResult<SessionToken>;

    /// Get session by ID
    async fn find_by_id(&self, id: &str) -> DbResult<Option<SessionToken>>;

    /// Delete a session, returning whether a row was removed
    async fn delete(&self, id: &str) -> DbResult<bool>;

    /// Delete sessions whose expiry has passed
    async fn delete_expired(&self) -> DbResult<u64>;

    /// Number of sessions held by an admin
    async fn count_by_admin(&self, admin_id: &str) -> DbResult<i64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[derive(sqlx::FromRow)]
struct SessionTokenRow {
    id: String,
    token: String,
    admin_id: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SessionTokenRow> for SessionToken {
    fn from(row: SessionTokenRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            admin_id: row.admin_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SessionTokenRepository for SqlxSessionTokenRepository {
    async fn create(&self, session: &SessionToken) -> DbResult<SessionToken> {
        const SQL: &str = r#"
            INSERT INTO session_tokens (id, token, admin_id, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
        "#;

        with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(&session.id)
            .bind(&session.token)
            .bind(&session.admin_id)
            .bind(session.expires_at)
            .bind(session.created_at)
            .execute(p)
            .await
            .map(|_| ()))?;

        Ok(session.clone())
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<SessionToken>> {
        const SQL: &str = r#"
            SELECT id, token, admin_id, expires_at, created_at
            FROM session_tokens
            WHERE id = ?
        "#;

        let row = with_pool!(self.pool, |p| sqlx::query_as::<_, SessionTokenRow>(SQL)
            .bind(id)
            .fetch_optional(p)
            .await)?;
        Ok(row.map(SessionToken::from))
    }

    async fn delete(&self, id: &str) -> DbResult<bool> {
        const SQL: &str = "DELETE FROM session_tokens WHERE id = ?";
        let affected = with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(id)
            .execute(p)
            .await
            .map(|r| r.rows_affected()))?;
        Ok(affected > 0)
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        const SQL: &str = "DELETE FROM session_tokens WHERE expires_at < ?";
        let now = Utc::now();
        let affected = with_pool!(self.pool, |p| sqlx::query(SQL)
            .bind(now)
            .execute(p)
            .await
            .map(|r| r.rows_affected()))?;
        Ok(affected)
    }

    async fn count_by_admin(&self, admin_id: &str) -> DbResult<i64> {
        const SQL: &str = "SELECT COUNT(*) FROM session_tokens WHERE admin_id = ?";
        let count: i64 = with_pool!(self.pool, |p| sqlx::query_scalar(SQL)
            .bind(admin_id)
            .fetch_one(p)
            .await)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AdminUserRepository, SqlxAdminUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::AdminUser;
    use chrono::Duration;

    async fn setup_test_repo() -> (SqlxSessionTokenRepository, AdminUser) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let admin = AdminUser::new("a@b.com".into(), "A B".into(), "hash".into());
        SqlxAdminUserRepository::new(pool.clone())
            .create(&admin)
            .await
            .expect("Failed to create admin");

        (SqlxSessionTokenRepository::new(pool), admin)
    }

    #[tokio::test]
    async fn test_create_and_find_session() {
        let (repo, admin) = setup_test_repo().await;
        let session = SessionToken::new(&admin.id, Duration::hours(24));
        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .find_by_id(&session.id)
            .await
            .unwrap()
            .expect("Session not found");
        assert_eq!(found.token, session.token);
        assert_eq!(found.admin_id, admin.id);
        assert_eq!(repo.count_by_admin(&admin.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (repo, admin) = setup_test_repo().await;
        let session = SessionToken::new(&admin.id, Duration::hours(24));
        repo.create(&session).await.unwrap();

        assert!(repo.delete(&session.id).await.unwrap());
        assert!(repo.find_by_id(&session.id).await.unwrap().is_none());

        // Second delete finds nothing but is not an error
        assert!(!repo.delete(&session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (repo, admin) = setup_test_repo().await;

        let mut expired = SessionToken::new(&admin.id, Duration::hours(24));
        expired.expires_at = Utc::now() - Duration::hours(1);
        let valid = SessionToken::new(&admin.id, Duration::hours(24));

        repo.create(&expired).await.unwrap();
        repo.create(&valid).await.unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.find_by_id(&expired.id).await.unwrap().is_none());
        assert!(repo.find_by_id(&valid.id).await.unwrap().is_some());
    }
}
