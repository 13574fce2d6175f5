//! Session token model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side record authorizing issued access tokens.
///
/// The row is the source of truth: a session is valid only while it exists
/// and `expires_at` lies in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// Session ID, embedded in issued JWTs
    pub id: String,
    /// Opaque random token
    pub token: String,
    /// Owning admin
    pub admin_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionToken {
    /// Open a session for `admin_id` lasting `ttl`
    pub fn new(admin_id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            token: Uuid::new_v4().to_string(),
            admin_id: admin_id.into(),
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
