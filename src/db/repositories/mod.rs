//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod admin_user;
pub mod blog_post;
pub mod service;
pub mod session_token;

pub use admin_user::{AdminUserRepository, SqlxAdminUserRepository};
pub use blog_post::{BlogPostRepository, SqlxBlogPostRepository};
pub use service::{ServiceRepository, SqlxServiceRepository};
pub use session_token::{SessionTokenRepository, SqlxSessionTokenRepository};
