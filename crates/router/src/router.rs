//! Guarded navigation over the route table

use crate::guard::{AuthGuard, GuardDecision, NavigationGuard};
use crate::route::{LOGIN_PATH, RouteTable, View, normalize};
use smartmix_core::{SessionEvent, SessionStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, info, warn};

const MAX_GUARD_REDIRECTS: usize = 8;

/// Where the application currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// `None` for paths outside the route table
    pub view: Option<View>,
}

/// Result of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The requested path (after static redirects) was reached
    Proceeded(Location),
    /// A guard sent the navigation elsewhere
    Redirected { requested: String, location: Location },
}

impl Navigation {
    pub const fn location(&self) -> &Location {
        match self {
            Self::Proceeded(location) | Self::Redirected { location, .. } => location,
        }
    }

    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirected { .. })
    }
}

#[derive(Debug, Default)]
struct RouterState {
    current: Option<Location>,
    history: Vec<String>,
}

/// Application router
///
/// Every navigation, including the first, passes through the registered
/// guards. The router also listens to the session store: when a session
/// expires or is logged out it moves to the login screen.
pub struct Router {
    table: RouteTable,
    session: Arc<SessionStore>,
    guards: Vec<Box<dyn NavigationGuard>>,
    state: Mutex<RouterState>,
    events: Mutex<broadcast::Receiver<SessionEvent>>,
}

impl Router {
    /// Router over the default route table with the authentication guard
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_table(RouteTable::default(), session).guard(AuthGuard::default())
    }

    /// Router over `table` with no guards
    pub fn with_table(table: RouteTable, session: Arc<SessionStore>) -> Self {
        let events = session.subscribe();
        Self {
            table,
            session,
            guards: Vec::new(),
            state: Mutex::new(RouterState::default()),
            events: Mutex::new(events),
        }
    }

    /// Register a guard; guards run in registration order
    #[must_use]
    pub fn guard(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> Option<Location> {
        self.lock_state().current.clone()
    }

    pub fn current_path(&self) -> Option<String> {
        self.lock_state().current.as_ref().map(|l| l.path.clone())
    }

    /// Paths visited so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock_state().history.clone()
    }

    /// Navigate to `path`
    pub fn navigate(&self, path: &str) -> Navigation {
        let requested = normalize(path);
        let mut target = self.table.follow_redirects(&requested);
        let mut redirected = false;

        let mut hops = 0;
        while let GuardDecision::Redirect(to) = self.run_guards(&target) {
            let to = self.table.follow_redirects(&to);
            if to == target {
                break;
            }
            if hops == MAX_GUARD_REDIRECTS {
                warn!(requested = %requested, last = %target, "Guard redirect loop, stopping");
                break;
            }
            target = to;
            redirected = true;
            hops += 1;
        }

        let location = Location {
            view: self.table.view(&target),
            path: target,
        };

        {
            let mut state = self.lock_state();
            state.history.push(location.path.clone());
            state.current = Some(location.clone());
        }

        if redirected {
            debug!(requested = %requested, to = %location.path, "Navigation redirected");
            Navigation::Redirected {
                requested,
                location,
            }
        } else {
            debug!(path = %location.path, "Navigation proceeded");
            Navigation::Proceeded(location)
        }
    }

    /// Handle session events received since the last call
    ///
    /// Returns the number of events handled.
    pub fn apply_session_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = self
                .events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .try_recv();
            match next {
                Ok(event) => {
                    self.on_session_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events, revalidating current route");
                    self.revalidate();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        handled
    }

    /// Follow session events until the session store is dropped
    ///
    /// Intended to be spawned as a background task for the router's
    /// lifetime.
    pub async fn watch_session(&self) {
        let mut receiver = self.session.subscribe();
        loop {
            match receiver.recv().await {
                Ok(event) => self.on_session_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events, revalidating current route");
                    self.revalidate();
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    fn on_session_event(&self, event: SessionEvent) {
        info!(?event, "Session ended, returning to login");
        self.navigate(LOGIN_PATH);
    }

    /// Re-run the guards for the current location
    fn revalidate(&self) {
        let path = self.current_path().unwrap_or_else(|| "/".to_string());
        self.navigate(&path);
    }

    fn run_guards(&self, to: &str) -> GuardDecision {
        self.guards
            .iter()
            .map(|guard| guard.check(to, &self.session))
            .find(|decision| *decision != GuardDecision::Allow)
            .unwrap_or(GuardDecision::Allow)
    }

    fn lock_state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
