//! Errors shared by the content services (posts and service listings)

use crate::db::DbError;
use crate::validation::ValidationErrors;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Direct lookup of a post that does not exist
    #[error("Post not found")]
    PostNotFound,

    /// Direct lookup of a service listing that does not exist
    #[error("Service not found")]
    ServiceNotFound,

    /// Persistence failure, including unique violations and missing rows on
    /// update/delete
    #[error(transparent)]
    Db(#[from] DbError),
}
