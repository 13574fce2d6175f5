//! Connection pool handle
//!
//! [`Database`] wraps either a SQLite or a MySQL pool behind the
//! [`DatabasePool`] trait. One handle is opened at startup and passed to each
//! repository, which borrows the concrete pool through [`PoolRef`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const DEFAULT_SQLITE_CONNECTIONS: u32 = 10;
const DEFAULT_MYSQL_CONNECTIONS: u32 = 20;

/// Borrowed view of the concrete pool behind a [`DatabasePool`].
#[derive(Debug, Clone, Copy)]
pub enum PoolRef<'a> {
    Sqlite(&'a SqlitePool),
    Mysql(&'a MySqlPool),
}

/// Operations shared by every backend
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected row count
    async fn execute(&self, sql: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;

    async fn close(&self);

    fn driver(&self) -> DatabaseDriver;

    fn pool_ref(&self) -> PoolRef<'_>;
}

/// Shared handle to the configured pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

enum Backend {
    Sqlite(SqlitePool),
    Mysql(MySqlPool),
}

/// Pool for whichever driver the configuration selects
pub struct Database {
    backend: Backend,
}

/// Where a SQLite URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqliteTarget {
    /// URL handed to sqlx
    pub connect_url: String,
    /// Database file, `None` for in-memory databases
    pub file: Option<String>,
}

/// Normalize the forms accepted for SQLite: `:memory:`, `sqlite::memory:`,
/// `sqlite:path[?opts]` and bare paths. File databases are created on first
/// connect unless the URL carries its own options.
pub(crate) fn sqlite_target(url: &str) -> SqliteTarget {
    if url == ":memory:" || url.starts_with("sqlite::memory:") {
        let connect_url = if url == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            url.to_string()
        };
        return SqliteTarget {
            connect_url,
            file: None,
        };
    }

    let rest = url.strip_prefix("sqlite:").unwrap_or(url);
    let (path, options) = match rest.split_once('?') {
        Some((path, options)) => (path, Some(options)),
        None => (rest, None),
    };

    SqliteTarget {
        connect_url: format!("sqlite:{}?{}", path, options.unwrap_or("mode=rwc")),
        file: Some(path.to_string()),
    }
}

fn mysql_connect_url(url: &str) -> String {
    if url.starts_with("mysql://") {
        url.to_string()
    } else {
        format!("mysql://{}", url)
    }
}

impl Database {
    /// Open a SQLite pool, creating the parent directory of file databases
    pub async fn sqlite(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let target = sqlite_target(url);

        let options = match &target.file {
            Some(file) => {
                if let Some(parent) = Path::new(file).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create database directory: {:?}", parent)
                        })?;
                    }
                }
                SqlitePoolOptions::new()
                    .max_connections(max_connections.unwrap_or(DEFAULT_SQLITE_CONNECTIONS))
            }
            // Each connection would see its own empty in-memory database
            None => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        };

        let pool = options
            .connect(&target.connect_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self {
            backend: Backend::Sqlite(pool),
        })
    }

    /// Open a MySQL pool
    pub async fn mysql(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections.unwrap_or(DEFAULT_MYSQL_CONNECTIONS))
            .connect(&mysql_connect_url(url))
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self {
            backend: Backend::Mysql(pool),
        })
    }
}

#[async_trait]
impl DatabasePool for Database {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let affected = match &self.backend {
            Backend::Sqlite(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
        };
        Ok(affected)
    }

    async fn ping(&self) -> Result<()> {
        let result = match &self.backend {
            Backend::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Backend::Mysql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        };
        result.context("Database ping failed")
    }

    async fn close(&self) {
        match &self.backend {
            Backend::Sqlite(pool) => pool.close().await,
            Backend::Mysql(pool) => pool.close().await,
        }
    }

    fn driver(&self) -> DatabaseDriver {
        match self.backend {
            Backend::Sqlite(_) => DatabaseDriver::Sqlite,
            Backend::Mysql(_) => DatabaseDriver::Mysql,
        }
    }

    fn pool_ref(&self) -> PoolRef<'_> {
        match &self.backend {
            Backend::Sqlite(pool) => PoolRef::Sqlite(pool),
            Backend::Mysql(pool) => PoolRef::Mysql(pool),
        }
    }
}

/// Open the pool described by the configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = match config.driver {
        DatabaseDriver::Sqlite => Database::sqlite(&config.url, config.max_connections).await?,
        DatabaseDriver::Mysql => Database::mysql(&config.url, config.max_connections).await?,
    };
    Ok(Arc::new(db))
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
        max_connections: None,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_target_forms() {
        assert_eq!(
            sqlite_target(":memory:"),
            SqliteTarget {
                connect_url: "sqlite::memory:".into(),
                file: None,
            }
        );
        assert_eq!(sqlite_target("sqlite::memory:?cache=shared").file, None);

        let bare = sqlite_target("data/qss.db");
        assert_eq!(bare.connect_url, "sqlite:data/qss.db?mode=rwc");
        assert_eq!(bare.file.as_deref(), Some("data/qss.db"));

        let prefixed = sqlite_target("sqlite:data/qss.db");
        assert_eq!(prefixed.connect_url, "sqlite:data/qss.db?mode=rwc");

        let with_options = sqlite_target("sqlite:/tmp/x.db?mode=ro");
        assert_eq!(with_options.connect_url, "sqlite:/tmp/x.db?mode=ro");
        assert_eq!(with_options.file.as_deref(), Some("/tmp/x.db"));
    }

    #[test]
    fn test_mysql_connect_url() {
        assert_eq!(mysql_connect_url("mysql://u@h/db"), "mysql://u@h/db");
        assert_eq!(mysql_connect_url("u@h/db"), "mysql://u@h/db");
    }

    #[tokio::test]
    async fn test_sqlite_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(matches!(pool.pool_ref(), PoolRef::Sqlite(_)));
        pool.ping().await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_in_memory_pool_keeps_its_tables() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        pool.execute("CREATE TABLE probe (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        let affected = pool
            .execute("INSERT INTO probe (name) VALUES ('a'), ('b')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn test_sqlite_file_in_nested_directory() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("qss.db");

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
            max_connections: Some(2),
        })
        .await
        .expect("Failed to create pool");

        pool.ping().await.expect("Ping should succeed");
        assert!(db_path.exists());
        pool.close().await;
    }

    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_ping() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
            max_connections: None,
        })
        .await
        .expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        pool.ping().await.expect("Ping should succeed");
    }
}
