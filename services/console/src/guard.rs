//! Navigation guard
//!
//! [`decide`] is a pure function of the target route and the session state.
//! [`Navigator`] applies it on top of the route table and records where the
//! session ends up.

use std::collections::BTreeMap;

use tracing::{debug, info};

use api::session::{SessionContext, SessionState};

use crate::routes::{LANDING_ROUTE, LOGIN_ROUTE, ResolvedRoute, RouteTable};

/// Query key carrying the originally requested path to the login surface
pub const REDIRECT_QUERY_KEY: &str = "redirect";

const MAX_REDIRECTS: usize = 5;

/// Guard verdict for a route transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    RedirectTo {
        name: String,
        query: Vec<(String, String)>,
    },
}

/// Decide whether the session may enter `target`
pub fn decide(target: &ResolvedRoute, session: &SessionState) -> NavigationDecision {
    let authenticated = session.is_authenticated();

    if target.route.requires_auth && !authenticated {
        return NavigationDecision::RedirectTo {
            name: LOGIN_ROUTE.to_string(),
            query: vec![(REDIRECT_QUERY_KEY.to_string(), target.full_path.clone())],
        };
    }

    if target.name() == LOGIN_ROUTE && authenticated {
        return NavigationDecision::RedirectTo {
            name: LANDING_ROUTE.to_string(),
            query: Vec::new(),
        };
    }

    NavigationDecision::Allow
}

/// Where a navigation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The session now displays `route`; `redirected` is set when the guard
    /// or a forwarding route changed the destination
    Arrived {
        route: ResolvedRoute,
        redirected: bool,
    },
    /// No route matches the path
    NotFound(String),
}

/// Guarded navigation over a route table
#[derive(Debug)]
pub struct Navigator {
    routes: RouteTable,
    session: SessionContext,
}

impl Navigator {
    pub fn new(routes: RouteTable, session: SessionContext) -> Self {
        Self { routes, session }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Navigate to `path`, following forwarding routes and guard redirects
    pub fn navigate(&self, path: &str) -> NavigationOutcome {
        let mut current = path.to_string();
        let mut redirected = false;

        for _ in 0..MAX_REDIRECTS {
            let Some(target) = self.routes.resolve(&current) else {
                debug!("No route matches {}", current);
                return NavigationOutcome::NotFound(current);
            };

            let next = match target.route.redirect {
                Some(name) => self.path_to(name, &[]),
                None => match decide(&target, &self.session.snapshot()) {
                    NavigationDecision::Allow => {
                        self.session.set_location(&current);
                        return NavigationOutcome::Arrived {
                            route: target,
                            redirected,
                        };
                    }
                    NavigationDecision::RedirectTo { name, query } => {
                        info!("Guard redirected {} to {}", current, name);
                        self.path_to(&name, &query)
                    }
                },
            };

            match next {
                Some(next) => {
                    current = next;
                    redirected = true;
                }
                None => return NavigationOutcome::NotFound(current),
            }
        }

        NavigationOutcome::NotFound(current)
    }

    /// Path to resume after a successful login: the `redirect` query value of
    /// the login route, or the landing route
    pub fn resume_path(&self, login: &ResolvedRoute) -> String {
        login
            .query_value(REDIRECT_QUERY_KEY)
            .filter(|path| is_local_path(path))
            .map(str::to_string)
            .or_else(|| self.path_to(LANDING_ROUTE, &[]))
            .unwrap_or_else(|| "/".to_string())
    }

    fn path_to(&self, name: &str, query: &[(String, String)]) -> Option<String> {
        let path = self.routes.path_for(name, &BTreeMap::new())?;
        if query.is_empty() {
            return Some(path);
        }
        let query = query
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        Some(format!("{}?{}", path, query))
    }
}

/// Path on this console: rooted, and not a protocol-relative URL
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::models::User;
    use serde_json::json;

    fn authenticated() -> SessionState {
        SessionState {
            current_user: Some(User::from_value(&json!({"id": 1})).unwrap()),
            auth_token: Some("tok".to_string()),
            is_loading: false,
        }
    }

    fn resolve(path: &str) -> ResolvedRoute {
        RouteTable::admin_console().unwrap().resolve(path).unwrap()
    }

    #[test]
    fn test_protected_route_while_anonymous_redirects_to_login() {
        let decision = decide(&resolve("/admin/users/4?tab=info"), &SessionState::default());
        assert_eq!(
            decision,
            NavigationDecision::RedirectTo {
                name: LOGIN_ROUTE.to_string(),
                query: vec![(
                    REDIRECT_QUERY_KEY.to_string(),
                    "/admin/users/4?tab=info".to_string()
                )],
            }
        );
    }

    #[test]
    fn test_login_while_authenticated_redirects_to_landing() {
        let decision = decide(&resolve("/login"), &authenticated());
        assert_eq!(
            decision,
            NavigationDecision::RedirectTo {
                name: LANDING_ROUTE.to_string(),
                query: Vec::new(),
            }
        );
    }

    #[test]
    fn test_public_route_is_always_allowed() {
        assert_eq!(decide(&resolve("/login"), &SessionState::default()), NavigationDecision::Allow);
        assert_eq!(decide(&resolve("/admin/profile"), &authenticated()), NavigationDecision::Allow);
    }

    #[test]
    fn test_token_without_user_is_anonymous() {
        let state = SessionState {
            auth_token: Some("tok".to_string()),
            ..SessionState::default()
        };
        assert!(matches!(
            decide(&resolve("/admin/dashboard"), &state),
            NavigationDecision::RedirectTo { .. }
        ));
    }

    #[test]
    fn test_navigate_anonymous_lands_on_login_with_resume_path() {
        let session = SessionContext::in_memory();
        let navigator = Navigator::new(RouteTable::admin_console().unwrap(), session.clone());

        let NavigationOutcome::Arrived { route, redirected } = navigator.navigate("/admin/course/3")
        else {
            panic!("expected to arrive somewhere");
        };
        assert!(redirected);
        assert_eq!(route.name(), LOGIN_ROUTE);
        assert_eq!(route.query_value(REDIRECT_QUERY_KEY), Some("/admin/course/3"));
        assert_eq!(navigator.resume_path(&route), "/admin/course/3");
        assert!(session.is_on_login_surface());
    }

    #[test]
    fn test_navigate_root_follows_forwarding_route() {
        let session = SessionContext::in_memory();
        session.set_session(
            "tok".to_string(),
            User::from_value(&json!({"id": 1})).unwrap(),
        );
        let navigator = Navigator::new(RouteTable::admin_console().unwrap(), session.clone());

        match navigator.navigate("/") {
            NavigationOutcome::Arrived { route, redirected } => {
                assert_eq!(route.name(), LANDING_ROUTE);
                assert!(redirected);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.location(), "/admin/dashboard");
    }

    #[test]
    fn test_navigate_unknown_path() {
        let navigator = Navigator::new(RouteTable::admin_console().unwrap(), SessionContext::in_memory());
        assert_eq!(
            navigator.navigate("/nowhere"),
            NavigationOutcome::NotFound("/nowhere".to_string())
        );
    }

    #[test]
    fn test_resume_path_defaults_to_landing() {
        let navigator = Navigator::new(RouteTable::admin_console().unwrap(), SessionContext::in_memory());
        assert_eq!(navigator.resume_path(&resolve("/login")), "/admin/dashboard");
        assert_eq!(
            navigator.resume_path(&resolve("/login?redirect=https%3A%2F%2Fevil.example")),
            "/admin/dashboard"
        );
        for external in ["%2F%2Fevil.example%2Fx", "%2F%5Cevil.example"] {
            let login = resolve(&format!("/login?redirect={}", external));
            assert_eq!(navigator.resume_path(&login), "/admin/dashboard");
        }
    }
}
