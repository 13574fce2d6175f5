//! Database migrations module
//!
//! Migrations are embedded in the binary as SQL strings, one variant per
//! supported driver, and tracked in the `_migrations` table.
//!
//! # Usage
//!
//! ```ignore
//! use qss_admin::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::{with_pool, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Row of the `_migrations` ledger
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admin_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id VARCHAR(36) PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id VARCHAR(36) PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_session_tokens",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS session_tokens (
                id VARCHAR(36) PRIMARY KEY,
                token VARCHAR(64) NOT NULL UNIQUE,
                admin_id VARCHAR(36) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_session_tokens_admin_id ON session_tokens(admin_id);
            CREATE INDEX IF NOT EXISTS idx_session_tokens_expires_at ON session_tokens(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS session_tokens (
                id VARCHAR(36) PRIMARY KEY,
                token VARCHAR(64) NOT NULL UNIQUE,
                admin_id VARCHAR(36) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_session_tokens_admin_id ON session_tokens(admin_id);
            CREATE INDEX idx_session_tokens_expires_at ON session_tokens(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blog_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                description TEXT,
                category VARCHAR(100),
                author VARCHAR(255),
                read_time VARCHAR(50),
                published BOOLEAN NOT NULL DEFAULT 0,
                featured BOOLEAN NOT NULL DEFAULT 0,
                published_at TIMESTAMP,
                image TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_by_id VARCHAR(36),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by_id) REFERENCES admin_users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blog_posts_created_at ON blog_posts(created_at);
            CREATE INDEX IF NOT EXISTS idx_blog_posts_published ON blog_posts(published);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content LONGTEXT NOT NULL,
                description TEXT NULL,
                category VARCHAR(100) NULL,
                author VARCHAR(255) NULL,
                read_time VARCHAR(50) NULL,
                published BOOLEAN NOT NULL DEFAULT FALSE,
                featured BOOLEAN NOT NULL DEFAULT FALSE,
                published_at TIMESTAMP NULL,
                image TEXT NULL,
                tags TEXT NOT NULL,
                created_by_id VARCHAR(36) NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by_id) REFERENCES admin_users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_blog_posts_created_at ON blog_posts(created_at);
            CREATE INDEX idx_blog_posts_published ON blog_posts(published);
        "#,
    },
    Migration {
        version: 4,
        name: "create_services",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS services (
                id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(100) NOT NULL,
                summary TEXT NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NOT NULL,
                features TEXT NOT NULL DEFAULT '[]',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_services_created_at ON services(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS services (
                id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(100) NOT NULL,
                summary TEXT NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(100) NOT NULL,
                features TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_services_created_at ON services(created_at);
        "#,
    },
];

/// Apply every migration not yet recorded in `_migrations`.
///
/// Returns how many were applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    ensure_ledger(pool).await?;

    let done: HashSet<i64> = applied_migrations(pool)
        .await?
        .into_iter()
        .map(|record| record.version)
        .collect();

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !done.contains(&i64::from(m.version)))
        .collect();

    if pending.is_empty() {
        tracing::debug!("Schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");
        apply(pool, migration)
            .await
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
    }

    tracing::info!(count = pending.len(), "Migrations applied");
    Ok(pending.len())
}

/// Migrations recorded as applied, oldest first
pub async fn applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    const SQL: &str = "SELECT version, name, applied_at FROM _migrations ORDER BY version";

    let records = with_pool!(pool, |p| {
        sqlx::query_as::<_, MigrationRecord>(SQL).fetch_all(p).await
    })
    .context("Failed to read migration ledger")?;
    Ok(records)
}

/// Number of migrations not applied yet
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    ensure_ledger(pool).await?;
    let applied = applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

async fn ensure_ledger(pool: &DynDatabasePool) -> Result<()> {
    let version_type = match pool.driver() {
        DatabaseDriver::Sqlite => "INTEGER",
        DatabaseDriver::Mysql => "BIGINT",
    };
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS _migrations (\
            version {} PRIMARY KEY, \
            name VARCHAR(255) NOT NULL UNIQUE, \
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)",
        version_type
    );
    pool.execute(&sql).await?;
    Ok(())
}

async fn apply(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let script = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in statements(script) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Statement failed: {}", preview(statement)))?;
    }

    let recorded = with_pool!(pool, |p| {
        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(i64::from(migration.version))
            .bind(migration.name)
            .execute(p)
            .await
            .map(|_| ())
    });
    recorded.context("Failed to record migration")
}

/// First 100 characters of a statement, for error messages
fn preview(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a script on `;`, dropping empty and comment-only fragments
fn statements(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}
