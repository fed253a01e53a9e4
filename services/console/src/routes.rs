//! Route table of the admin console
//!
//! Paths use `:param` segments, optionally constrained with a pattern as in
//! `:id(\d+)`. The first route whose pattern matches wins.

use std::collections::BTreeMap;

use regex::Regex;

/// Name of the login route
pub const LOGIN_ROUTE: &str = "login";

/// Name of the landing route for signed-in users
pub const LANDING_ROUTE: &str = "admin.dashboard";

/// Route metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    pub path: &'static str,
    pub title: &'static str,
    pub requires_auth: bool,
    pub requires_admin: bool,
    /// Name of the route this one forwards to
    pub redirect: Option<&'static str>,
}

impl Route {
    const fn public(name: &'static str, path: &'static str, title: &'static str) -> Self {
        Self {
            name,
            path,
            title,
            requires_auth: false,
            requires_admin: false,
            redirect: None,
        }
    }

    const fn admin(name: &'static str, path: &'static str, title: &'static str) -> Self {
        Self {
            name,
            path,
            title,
            requires_auth: true,
            requires_admin: true,
            redirect: None,
        }
    }

    const fn redirect(path: &'static str, target: &'static str) -> Self {
        Self {
            name: "",
            path,
            title: "",
            requires_auth: false,
            requires_admin: false,
            redirect: Some(target),
        }
    }
}

/// Routes of the admin console, in match order
pub const ADMIN_CONSOLE_ROUTES: &[Route] = &[
    Route::redirect("/", LANDING_ROUTE),
    Route::public(LOGIN_ROUTE, "/login", "Login"),
    Route::admin(LANDING_ROUTE, "/admin/dashboard", "Dashboard"),
    Route::admin("admin.users", "/admin/users", "Users"),
    Route::admin("admin.users.create", "/admin/users/create", "Create User"),
    Route::admin("admin.users.edit", "/admin/users/:id/edit", "Edit User"),
    Route::admin("admin.users.show", "/admin/users/:id", "Show User"),
    Route::admin("admin.profile", "/admin/profile", "Profile"),
    Route::admin("admin.course", "/admin/course", "Course"),
    Route::admin("admin.course.create", "/admin/course/create", "Create Course"),
    Route::admin("admin.course.edit", r"/admin/course/:id(\d+)/edit", "Edit Course"),
    Route::admin("admin.course.show", r"/admin/course/:id(\d+)", "Show Course"),
    Route::admin("admin.course-type", "/admin/course-type", "Course Types"),
    Route::admin(
        "admin.course-type.create",
        "/admin/course-type/create",
        "Create Course Type",
    ),
    Route::admin(
        "admin.course-type.edit",
        "/admin/course-type/:id/edit",
        "Edit Course Type",
    ),
];

/// A path matched against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: Route,
    /// Requested path including query and fragment
    pub full_path: String,
    pub params: BTreeMap<String, String>,
    /// Decoded query pairs, in request order
    pub query: Vec<(String, String)>,
}

impl ResolvedRoute {
    pub fn name(&self) -> &'static str {
        self.route.name
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// First query value for `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
struct CompiledRoute {
    route: Route,
    pattern: Regex,
    params: Vec<String>,
}

/// Route table with compiled path patterns
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Route table of the admin console
    pub fn admin_console() -> Result<Self, regex::Error> {
        Self::new(ADMIN_CONSOLE_ROUTES)
    }

    /// Compile a route table
    pub fn new(routes: &[Route]) -> Result<Self, regex::Error> {
        let routes = routes
            .iter()
            .map(|route| {
                let (pattern, params) = compile_path(route.path)?;
                Ok(CompiledRoute {
                    route: *route,
                    pattern,
                    params,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { routes })
    }

    /// Match a path (query string and fragment allowed) against the table
    pub fn resolve(&self, full_path: &str) -> Option<ResolvedRoute> {
        let (path, query) = split_path(full_path);

        self.routes.iter().find_map(|compiled| {
            let captures = compiled.pattern.captures(path)?;
            let params = compiled
                .params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), decode(value.as_str())))
                })
                .collect();

            Some(ResolvedRoute {
                route: compiled.route,
                full_path: full_path.to_string(),
                params,
                query: parse_query(query),
            })
        })
    }

    /// Route with the given name
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes
            .iter()
            .map(|compiled| &compiled.route)
            .find(|route| !route.name.is_empty() && route.name == name)
    }

    /// Path of a named route, with its parameters filled in
    pub fn path_for(&self, name: &str, params: &BTreeMap<String, String>) -> Option<String> {
        let route = self.by_name(name)?;
        let segments: Option<Vec<String>> = route
            .path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => {
                    let param = param.split('(').next().unwrap_or(param);
                    params
                        .get(param)
                        .map(|value| urlencoding::encode(value).into_owned())
                }
                None => Some(segment.to_string()),
            })
            .collect();
        segments.map(|segments| segments.join("/"))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|compiled| &compiled.route)
    }
}

/// Turn a route path into an anchored regex and its parameter names
fn compile_path(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
    let mut params = Vec::new();
    let mut pattern = String::from("^");

    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        pattern.push('/');
        match segment.strip_prefix(':') {
            Some(param) => {
                let (name, constraint) = match param.split_once('(') {
                    Some((name, rest)) => (name, rest.strip_suffix(')').unwrap_or(rest)),
                    None => (param, "[^/]+"),
                };
                pattern.push_str(&format!("(?P<{}>{})", name, constraint));
                params.push(name.to_string());
            }
            None => pattern.push_str(&regex::escape(segment)),
        }
    }

    pattern.push_str("/?$");
    Ok((Regex::new(&pattern)?, params))
}

fn split_path(full_path: &str) -> (&str, &str) {
    let without_fragment = full_path.split('#').next().unwrap_or_default();
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));
    if path.is_empty() { ("/", query) } else { (path, query) }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(text: &str) -> String {
    let text = text.replace('+', " ");
    urlencoding::decode(&text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(text)
}
