//! SmartMix client navigation
//!
//! A static route table, navigation guards run before every transition, and
//! a [`Router`] that follows the session store's lifecycle events.

pub mod guard;
pub mod route;
pub mod router;

pub use guard::{AuthGuard, GuardDecision, NavigationGuard};
pub use route::{LOGIN_PATH, ROUTES, RouteEntry, RouteTable, RouteTarget, View};
pub use router::{Location, Navigation, Router};
