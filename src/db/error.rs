//! Typed persistence errors
//!
//! Repositories translate driver errors into [`DbError`] so callers can match
//! on constraint violations and missing rows instead of inspecting driver
//! specific codes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Error returned by every repository operation
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A unique index rejected the write
    #[error("{message}")]
    UniqueViolation {
        /// Columns covered by the violated index
        target: Vec<String>,
        message: String,
    },

    /// The row addressed by an update or delete does not exist
    #[error("Record not found")]
    NotFound,

    /// Any other database failure
    #[error(transparent)]
    Query(#[from] anyhow::Error),
}

/// Repository result alias
pub type DbResult<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Build a unique violation for the given columns
    pub fn unique(target: Vec<String>) -> Self {
        let message = if target.is_empty() {
            "Unique constraint failed".to_string()
        } else {
            format!(
                "Unique constraint failed on the fields: (`{}`)",
                target.join("`,`")
            )
        };
        DbError::UniqueViolation { target, message }
    }

    /// Whether this is a unique violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DbError::unique(unique_target(db_err.message()));
            }
        }
        DbError::Query(err.into())
    }
}

// SQLite: "UNIQUE constraint failed: blog_posts.slug, blog_posts.x"
static SQLITE_UNIQUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"UNIQUE constraint failed: (.+)$").expect("valid regex"));

// MySQL: "Duplicate entry 'x' for key 'blog_posts.slug'"
static MYSQL_DUPLICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"for key '([^']+)'").expect("valid regex"));

/// Extract the violated columns from a driver message.
pub fn unique_target(message: &str) -> Vec<String> {
    if let Some(caps) = SQLITE_UNIQUE.captures(message) {
        return caps[1]
            .split(',')
            .map(|column| column.trim())
            .map(|column| column.rsplit('.').next().unwrap_or(column).to_string())
            .filter(|column| !column.is_empty())
            .collect();
    }

    if let Some(caps) = MYSQL_DUPLICATE.captures(message) {
        let key = &caps[1];
        let column = key.rsplit('.').next().unwrap_or(key);
        return vec![column.to_string()];
    }

    Vec::new()
}
