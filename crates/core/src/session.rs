//! Authentication session state with write-through persistence
//!
//! [`SessionStore`] is the single source of truth for the current token,
//! roles and profile. Every mutation is written to durable storage before it
//! becomes visible in memory, and the end of a session is broadcast as a
//! [`SessionEvent`] so other layers can react without depending on the
//! component that ended it.

use crate::error::CoreResult;
use crate::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Storage key holding the raw token string
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-encoded role array
pub const ROLES_KEY: &str = "roles";
/// Storage key holding the JSON-encoded profile object
pub const USER_INFO_KEY: &str = "userInfo";

const EVENT_CAPACITY: usize = 16;

/// Opaque user profile record
pub type Profile = serde_json::Map<String, serde_json::Value>;

/// Snapshot of the authentication state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token; empty when unauthenticated
    pub token: String,
    pub roles: Vec<String>,
    pub profile: Profile,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Notifications broadcast when a session ends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the credential
    Expired,
    /// The user logged out
    LoggedOut,
}

/// Shared session handle
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.is_authenticated())
            .field("roles", &state.roles)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the session from `storage`
    ///
    /// Missing entries start empty. Entries that do not parse are logged and
    /// replaced by their empty value; a storage read failure is returned.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> CoreResult<Self> {
        let token = storage.get(TOKEN_KEY)?.unwrap_or_default();
        let roles: Vec<String> = read_json(storage.as_ref(), ROLES_KEY)?;
        let profile: Profile = read_json(storage.as_ref(), USER_INFO_KEY)?;

        debug!(
            authenticated = !token.is_empty(),
            roles = roles.len(),
            "Restored session from storage"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            storage,
            state: RwLock::new(Session {
                token,
                roles,
                profile,
            }),
            events,
        })
    }

    /// Current token; empty when unauthenticated
    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    pub fn roles(&self) -> Vec<String> {
        self.read().roles.clone()
    }

    pub fn profile(&self) -> Profile {
        self.read().profile.clone()
    }

    /// Copy of the whole session
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Replace the token. The value is stored as given, without validation.
    pub fn set_token(&self, token: impl Into<String>) -> CoreResult<()> {
        let token = token.into();
        let mut state = self.write();
        self.storage.set(TOKEN_KEY, &token)?;
        state.token = token;
        Ok(())
    }

    pub fn set_roles(&self, roles: Vec<String>) -> CoreResult<()> {
        let encoded = serde_json::to_string(&roles)?;
        let mut state = self.write();
        self.storage.set(ROLES_KEY, &encoded)?;
        state.roles = roles;
        Ok(())
    }

    pub fn set_info(&self, profile: Profile) -> CoreResult<()> {
        let encoded = serde_json::to_string(&profile)?;
        let mut state = self.write();
        self.storage.set(USER_INFO_KEY, &encoded)?;
        state.profile = profile;
        Ok(())
    }

    /// End the session at the user's request
    pub fn logout(&self) -> CoreResult<()> {
        info!("Logging out");
        self.clear(SessionEvent::LoggedOut)
    }

    /// End the session because the server rejected its credential
    pub fn expire(&self) -> CoreResult<()> {
        warn!("Session expired, clearing credentials");
        self.clear(SessionEvent::Expired)
    }

    /// Receive future session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Reset memory, then remove every key even if an earlier removal failed.
    /// The event is sent regardless; the first storage error is returned.
    fn clear(&self, event: SessionEvent) -> CoreResult<()> {
        let result = {
            let mut state = self.write();
            *state = Session::default();
            [TOKEN_KEY, ROLES_KEY, USER_INFO_KEY]
                .into_iter()
                .map(|key| self.storage.remove(key))
                .fold(Ok(()), |acc, removed| acc.and(removed))
        };

        // No subscribers is fine
        let _ = self.events.send(event);
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_json<T: DeserializeOwned + Default>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> CoreResult<T> {
    let Some(raw) = storage.get(key)? else {
        return Ok(T::default());
    };

    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "Ignoring malformed persisted value");
        T::default()
    }))
}
