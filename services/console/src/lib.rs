//! Admin console core
//!
//! Session state machine, route table with its navigation guard, and the
//! theme preference, on top of the `api` client.

pub mod guard;
pub mod routes;
pub mod session;
pub mod theme;

pub use guard::{NavigationDecision, NavigationOutcome, Navigator, decide};
pub use routes::{ResolvedRoute, Route, RouteTable};
pub use session::{LoginResult, SessionStore};
pub use theme::{Theme, ThemeStore};
