//! Services layer - Business logic
//!
//! Services implement the business rules on top of the repositories:
//! - Validating inputs
//! - Account, session and token handling
//! - Content CRUD for posts and service listings

pub mod auth;
pub mod blog;
pub mod catalog;
pub mod error;
pub mod password;
pub mod token;

pub use auth::{AuthService, AuthServiceError, LoginResponse};
pub use blog::BlogService;
pub use catalog::CatalogService;
pub use error::ContentServiceError;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};
