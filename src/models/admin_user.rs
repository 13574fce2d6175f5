//! Admin user model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to every admin account
pub const ADMIN_ROLE: &str = "admin";

/// Permission required by the admin dashboard
pub const ADMIN_ACCESS_PERMISSION: &str = "admin:access";

/// Staff account allowed to manage site content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    /// Unique identifier (UUID)
    pub id: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Create a new admin with a freshly generated id.
    ///
    /// The password must already be hashed.
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Roles derived for the public user projection
    pub fn roles(&self) -> Vec<String> {
        vec![ADMIN_ROLE.to_string()]
    }

    /// Permissions derived for the public user projection
    pub fn permissions(&self) -> Vec<String> {
        vec![ADMIN_ACCESS_PERMISSION.to_string()]
    }
}

/// User projection returned by login and cached by the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl From<&AdminUser> for PublicUser {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id.clone(),
            email: Some(admin.email.clone()),
            name: Some(admin.name.clone()),
            roles: admin.roles(),
            permissions: admin.permissions(),
        }
    }
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminContext {
    pub id: String,
    pub email: String,
    pub name: String,
    pub session_id: String,
}
