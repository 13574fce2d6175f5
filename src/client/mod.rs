//! Dashboard client
//!
//! Everything the admin dashboard needs to talk to the server:
//! - `session`: persisted auth session (token + user) and permission checks
//! - `claims`: unverified JWT payload decoding
//! - `guard`: route access decisions
//! - `api`: typed HTTP client for `/api/admin`
//! - `cache`: query cache with list/detail invalidation

pub mod api;
pub mod cache;
pub mod claims;
pub mod guard;
pub mod session;

pub use api::{admin_api_base_url, AdminApiClient, ClientError};
pub use cache::{CachedAdminApi, QueryCache, QueryKey};
pub use claims::{claims_to_user, decode_claims, Claims};
pub use guard::{GuardDecision, RouteGuard};
pub use session::{AuthSession, AuthState, FileStore, MemoryStore, TokenStore};
