//! Route guard for dashboard screens

use super::session::AuthSession;

/// Where unauthenticated visitors are sent
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// Outcome of evaluating a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading; render a placeholder
    Pending,
    /// Render the protected screen
    Allow,
    /// Authenticated but lacking a permission or role; render the fallback
    Forbidden,
    /// Navigate away, remembering the requested location
    Redirect {
        to: String,
        from: String,
        unauthorized: bool,
    },
}

/// Access requirements for a screen
#[derive(Debug, Clone)]
pub struct RouteGuard {
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
    pub require_all_permissions: bool,
    pub require_all_roles: bool,
    pub redirect_to: String,
    /// Render a fallback instead of redirecting when access is denied
    pub has_fallback: bool,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            permissions: Vec::new(),
            roles: Vec::new(),
            require_all_permissions: true,
            require_all_roles: true,
            redirect_to: DEFAULT_LOGIN_PATH.to_string(),
            has_fallback: false,
        }
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Accept any one of the listed permissions instead of all of them
    pub fn any_permission(mut self) -> Self {
        self.require_all_permissions = false;
        self
    }

    /// Accept any one of the listed roles instead of all of them
    pub fn any_role(mut self) -> Self {
        self.require_all_roles = false;
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }

    pub fn with_fallback(mut self) -> Self {
        self.has_fallback = true;
        self
    }

    /// Decide what to render for `from`, the location being visited
    pub fn evaluate(&self, session: &AuthSession, from: &str) -> GuardDecision {
        if session.is_loading() {
            return GuardDecision::Pending;
        }

        if !session.is_authenticated() {
            return GuardDecision::Redirect {
                to: self.redirect_to.clone(),
                from: from.to_string(),
                unauthorized: false,
            };
        }

        let permitted = satisfies(&self.permissions, self.require_all_permissions, |p| {
            session.has_permission(p)
        });
        let in_role = satisfies(&self.roles, self.require_all_roles, |r| session.has_role(r));

        if permitted && in_role {
            GuardDecision::Allow
        } else if self.has_fallback {
            GuardDecision::Forbidden
        } else {
            GuardDecision::Redirect {
                to: self.redirect_to.clone(),
                from: from.to_string(),
                unauthorized: true,
            }
        }
    }
}

fn satisfies(required: &[String], require_all: bool, check: impl Fn(&str) -> bool) -> bool {
    if required.is_empty() {
        return true;
    }
    if require_all {
        required.iter().all(|item| check(item))
    } else {
        required.iter().any(|item| check(item))
    }
}
