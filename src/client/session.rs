//! Dashboard auth session
//!
//! Holds the access token and the user it belongs to, persisted in a
//! [`TokenStore`] under two keys. The server-supplied user is the source of
//! truth for identity; claims decoded from the token are only a fallback.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::claims::{claims_to_user, decode_claims, Claims};
use crate::models::PublicUser;

/// Store key holding the raw access token
pub const TOKEN_KEY: &str = "qss.auth.token";

/// Store key holding the JSON-encoded user
pub const USER_KEY: &str = "qss.auth.user";

/// Key/value persistence for the session
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store, mainly for tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file on disk
///
/// A missing file reads as empty. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("file store lock poisoned"))?;
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

/// Lifecycle of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Client-side auth context
pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    state: AuthState,
    token: Option<String>,
    user: Option<PublicUser>,
    claims: Option<Claims>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &self.state)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// A session that has not read its store yet
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            state: AuthState::Loading,
            token: None,
            user: None,
            claims: None,
        }
    }

    /// Create a session and load whatever the store holds
    pub fn restore(store: Arc<dyn TokenStore>) -> Self {
        let mut session = Self::new(store);
        session.reload();
        session
    }

    /// Re-read token and user from the store.
    ///
    /// Store failures are logged and treated as an empty store. A stored user
    /// without a token is ignored.
    pub fn reload(&mut self) {
        self.token = self.read(TOKEN_KEY);
        self.claims = self.token.as_deref().and_then(decode_claims);

        if self.token.is_none() {
            self.user = None;
            self.state = AuthState::Unauthenticated;
            return;
        }

        self.user = match self.read(USER_KEY) {
            Some(raw) => match serde_json::from_str::<PublicUser>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable stored user");
                    self.remove(USER_KEY);
                    self.claims.as_ref().map(claims_to_user)
                }
            },
            None => self.claims.as_ref().map(claims_to_user),
        };
        self.state = AuthState::Authenticated;
    }

    /// Persist a freshly issued token and the user it belongs to.
    ///
    /// Without a server-supplied user the identity is derived from the token
    /// claims; when neither is available any stored user is dropped.
    pub fn login(&mut self, token: impl Into<String>, user: Option<PublicUser>) -> Result<()> {
        let token = token.into();
        let claims = decode_claims(&token);
        let user = user.or_else(|| claims.as_ref().map(claims_to_user));

        self.store.set(TOKEN_KEY, &token)?;
        match &user {
            Some(user) => self.store.set(USER_KEY, &serde_json::to_string(user)?)?,
            None => self.store.remove(USER_KEY)?,
        }

        self.token = Some(token);
        self.claims = claims;
        self.user = user;
        self.state = AuthState::Authenticated;
        Ok(())
    }

    /// Forget the token and user
    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;

        self.token = None;
        self.claims = None;
        self.user = None;
        self.state = AuthState::Unauthenticated;
        Ok(())
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Loading
    }

    /// Case-insensitive permission check; an empty permission is always granted
    pub fn has_permission(&self, permission: &str) -> bool {
        if permission.is_empty() {
            return true;
        }
        self.user
            .as_ref()
            .is_some_and(|u| contains_ignore_case(&u.permissions, permission))
    }

    /// Case-insensitive role check; an empty role is always granted
    pub fn has_role(&self, role: &str) -> bool {
        if role.is_empty() {
            return true;
        }
        self.user
            .as_ref()
            .is_some_and(|u| contains_ignore_case(&u.roles, role))
    }

    /// Raw claim lookup
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.as_ref().and_then(|c| c.get(name))
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Failed to read auth store");
            None
        })
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key, error = %e, "Failed to clear auth store entry");
        }
    }
}

fn contains_ignore_case(items: &[String], wanted: &str) -> bool {
    items.iter().any(|item| item.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::claims::encode_test_token;
    use serde_json::json;

    fn admin_user() -> PublicUser {
        PublicUser {
            id: "u1".into(),
            email: Some("a@b.com".into()),
            name: Some("A B".into()),
            roles: vec!["admin".into()],
            permissions: vec!["admin:access".into()],
        }
    }

    fn memory() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_new_session_is_loading() {
        let session = AuthSession::new(memory());
        assert!(session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_restore_empty_store() {
        let session = AuthSession::restore(memory());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.user().is_none());
    }

    #[test]
    fn test_stored_user_without_token_is_ignored() {
        let store = memory();
        store
            .set(USER_KEY, &serde_json::to_string(&admin_user()).unwrap())
            .unwrap();

        let session = AuthSession::restore(store);
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.user().is_none());
        assert!(!session.has_permission("admin:access"));
        assert!(!session.has_role("admin"));
    }

    #[test]
    fn test_stored_user_wins_over_claims() {
        let store = memory();
        let token = encode_test_token(&json!({ "sub": "from-claims", "roles": "viewer" }));
        store.set(TOKEN_KEY, &token).unwrap();
        store
            .set(USER_KEY, &serde_json::to_string(&admin_user()).unwrap())
            .unwrap();

        let session = AuthSession::restore(store);
        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(session.user().unwrap().id, "u1");
        assert_eq!(session.claim("sub"), Some(&json!("from-claims")));
    }

    #[test]
    fn test_unreadable_user_falls_back_to_claims() {
        let store = memory();
        let token = encode_test_token(&json!({ "sub": "u9", "scope": "admin:access" }));
        store.set(TOKEN_KEY, &token).unwrap();
        store.set(USER_KEY, "{not json").unwrap();

        let session = AuthSession::restore(store.clone());
        let user = session.user().unwrap();
        assert_eq!(user.id, "u9");
        assert_eq!(user.permissions, vec!["admin:access".to_string()]);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_login_without_user_uses_claims() {
        let store = memory();
        let mut session = AuthSession::restore(store.clone());
        let token = encode_test_token(&json!({ "sub": "u2", "email": "c@d.com" }));

        session.login(token.clone(), None).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().email.as_deref(), Some("c@d.com"));
        assert_eq!(store.get(TOKEN_KEY).unwrap(), Some(token));
        assert!(store.get(USER_KEY).unwrap().is_some());
    }

    #[test]
    fn test_login_with_opaque_token_clears_user() {
        let store = memory();
        store.set(USER_KEY, "stale").unwrap();
        let mut session = AuthSession::new(store.clone());

        session.login("opaque", None).unwrap();
        assert!(session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_logout_clears_store() {
        let store = memory();
        let mut session = AuthSession::new(store.clone());
        session.login("opaque", Some(admin_user())).unwrap();

        session.logout().unwrap();
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_permission_and_role_checks() {
        let mut session = AuthSession::new(memory());
        assert!(!session.has_permission("admin:access"));
        assert!(session.has_permission(""));

        session.login("opaque", Some(admin_user())).unwrap();
        assert!(session.has_permission("ADMIN:Access"));
        assert!(session.has_role("Admin"));
        assert!(!session.has_role("editor"));
        assert!(session.has_role(""));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        {
            let store = Arc::new(FileStore::new(&path));
            let mut session = AuthSession::restore(store);
            session.login("opaque", Some(admin_user())).unwrap();
        }

        let session = AuthSession::restore(Arc::new(FileStore::new(&path)));
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("opaque"));
        assert_eq!(session.user(), Some(&admin_user()));
    }

    #[test]
    fn test_file_store_missing_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("auth.json"));
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "t").unwrap();
        store.set(USER_KEY, "u").unwrap();
        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), Some("u".to_string()));
    }
}
