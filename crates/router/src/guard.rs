//! Navigation guards

use crate::route::LOGIN_PATH;
use smartmix_core::SessionStore;

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Check run before every navigation completes
pub trait NavigationGuard: Send + Sync {
    fn check(&self, to: &str, session: &SessionStore) -> GuardDecision;
}

/// Sends every navigation without a token to the login screen
///
/// This only shapes the user experience; the API enforces authorization.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    login_path: String,
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new(LOGIN_PATH)
    }
}

impl AuthGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl NavigationGuard for AuthGuard {
    fn check(&self, to: &str, session: &SessionStore) -> GuardDecision {
        if to != self.login_path && !session.is_authenticated() {
            GuardDecision::Redirect(self.login_path.clone())
        } else {
            GuardDecision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartmix_core::MemoryStore;
    use std::sync::Arc;

    fn session(token: &str) -> SessionStore {
        let session = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        session.set_token(token).unwrap();
        session
    }

    #[test]
    fn test_redirects_without_token() {
        let guard = AuthGuard::default();
        let session = session("");
        for path in ["/dashboard", "/materials", "/mix/recipes", "/tasks", "/unknown"] {
            assert_eq!(
                guard.check(path, &session),
                GuardDecision::Redirect("/login".to_string())
            );
        }
    }

    #[test]
    fn test_login_always_allowed() {
        let guard = AuthGuard::default();
        assert_eq!(guard.check("/login", &session("")), GuardDecision::Allow);
        assert_eq!(guard.check("/login", &session("abc123")), GuardDecision::Allow);
    }

    #[test]
    fn test_allows_with_token() {
        let guard = AuthGuard::default();
        assert_eq!(guard.check("/tasks", &session("abc123")), GuardDecision::Allow);
    }

    #[test]
    fn test_custom_login_path() {
        let guard = AuthGuard::new("/signin");
        assert_eq!(guard.login_path(), "/signin");
        assert_eq!(
            guard.check("/login", &session("")),
            GuardDecision::Redirect("/signin".to_string())
        );
    }
}
