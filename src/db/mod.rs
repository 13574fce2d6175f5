//! Database layer
//!
//! The persistence gateway for the admin backend. It supports:
//! - SQLite (default, single-file deployment)
//! - MySQL
//!
//! The pool handle (`DynDatabasePool`) is created once at startup and handed
//! to each repository; nothing in this module keeps a process-wide client.
//! Repositories return [`DbError`], which distinguishes unique violations and
//! missing rows from other failures.
//!
//! # Usage
//!
//! ```ignore
//! use qss_admin::config::DatabaseConfig;
//! use qss_admin::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

/// Run the same sqlx expression against whichever concrete pool is configured.
///
/// The body is compiled once per driver, so row types are inferred for each.
macro_rules! with_pool {
    ($pool:expr, |$p:ident| $body:expr) => {
        match $pool.pool_ref() {
            $crate::db::PoolRef::Sqlite($p) => $body,
            $crate::db::PoolRef::Mysql($p) => $body,
        }
    };
}

pub(crate) use with_pool;

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use error::{DbError, DbResult};
pub use pool::{create_pool, create_test_pool, Database, DatabasePool, DynDatabasePool, PoolRef};
