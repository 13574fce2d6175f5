//! Admin authentication service
//!
//! Implements the account and session flow:
//! - registration with Argon2 password hashing
//! - login creating a session row and a signed access token
//! - logout deleting the session row
//! - per-request authentication of bearer tokens
//! - purging expired sessions
//!
//! A request is authenticated only when the token verifies AND its session row
//! still exists and has not expired. The token and session lifetimes are
//! configured separately.

use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{AdminUserRepository, SessionTokenRepository};
use crate::db::DbError;
use crate::models::{AdminContext, AdminUser, LoginInput, PublicUser, RegisterInput, SessionToken};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::TokenSigner;
use crate::validation::{Validate, ValidationErrors};

/// Default session lifetime in hours
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Error types for auth service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password; the two are not distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, malformed token, or token past `exp`
    #[error("Invalid token")]
    InvalidToken,

    /// Session row missing or past its expiry
    #[error("Session expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Authentication service
pub struct AuthService {
    admin_repo: Arc<dyn AdminUserRepository>,
    session_repo: Arc<dyn SessionTokenRepository>,
    signer: TokenSigner,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        admin_repo: Arc<dyn AdminUserRepository>,
        session_repo: Arc<dyn SessionTokenRepository>,
        signer: TokenSigner,
    ) -> Self {
        Self {
            admin_repo,
            session_repo,
            signer,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    /// Override the session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Register a new admin account
    pub async fn register(&self, input: RegisterInput) -> Result<AdminUser, AuthServiceError> {
        input.validate()?;

        let existing = self
            .admin_repo
            .find_by_email(&input.email)
            .await
            .context("Failed to look up admin by email")?;
        if existing.is_some() {
            tracing::debug!(email = %input.email, "Registration rejected: email taken");
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = hash_password(&input.password)?;
        let admin = AdminUser::new(input.email, input.name, password_hash);

        match self.admin_repo.create(&admin).await {
            Ok(created) => {
                tracing::info!(admin_id = %created.id, "Admin registered");
                Ok(created)
            }
            // Lost a race with a concurrent registration
            Err(DbError::UniqueViolation { .. }) => Err(AuthServiceError::EmailTaken),
            Err(e) => Err(anyhow::Error::from(e).context("Failed to create admin").into()),
        }
    }

    /// Verify credentials, open a session and sign an access token
    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse, AuthServiceError> {
        input.validate()?;

        let admin = self
            .admin_repo
            .find_by_email(&input.email)
            .await
            .context("Failed to look up admin by email")?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &admin.password_hash)? {
            tracing::debug!(admin_id = %admin.id, "Login rejected: wrong password");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let session = SessionToken::new(&admin.id, self.session_ttl);
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        let token = self
            .signer
            .issue(&admin.id, &session.id)
            .context("Failed to sign access token")?;

        tracing::info!(admin_id = %admin.id, session_id = %session.id, "Admin logged in");

        Ok(LoginResponse {
            token,
            user: PublicUser::from(&admin),
        })
    }

    /// Delete the session. A session that is already gone is not an error.
    pub async fn logout(&self, session_id: &str) -> Result<(), AuthServiceError> {
        let removed = self
            .session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        if removed {
            tracing::info!(session_id, "Admin logged out");
        } else {
            tracing::warn!(session_id, "Logout for a session that no longer exists");
        }
        Ok(())
    }

    /// Resolve a bearer token to the admin it authorizes
    pub async fn authenticate(&self, token: &str) -> Result<AdminContext, AuthServiceError> {
        let claims = self.signer.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AuthServiceError::InvalidToken
        })?;

        let session = self
            .session_repo
            .find_by_id(&claims.session_id)
            .await
            .context("Failed to load session")?
            .ok_or(AuthServiceError::SessionExpired)?;

        if session.is_expired() || session.admin_id != claims.sub {
            return Err(AuthServiceError::SessionExpired);
        }

        let admin = self
            .admin_repo
            .find_by_id(&session.admin_id)
            .await
            .context("Failed to load admin")?
            .ok_or(AuthServiceError::SessionExpired)?;

        Ok(AdminContext {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            session_id: session.id,
        })
    }

    /// Purge expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}
