//! Data models
//!
//! This module contains the data structures shared by the server and the
//! dashboard client:
//! - Database entities (AdminUser, SessionToken, BlogPost, Service)
//! - API request/response types

mod admin_user;
mod blog_post;
pub mod serde_ext;
mod service;
mod session_token;

pub use admin_user::{
    AdminContext, AdminUser, LoginInput, PublicUser, RegisterInput, ADMIN_ACCESS_PERMISSION,
    ADMIN_ROLE,
};
pub use blog_post::{BlogPost, CreateBlogPostInput, PostQuery, UpdateBlogPostInput};
pub use service::{CreateServiceInput, Service, ServiceQuery, UpdateServiceInput};
pub use session_token::SessionToken;
