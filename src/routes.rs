//! Routes, navigation and the guard in front of protected views

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::auth::SessionStore;

/// Views of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    Admin,
    Profile,
    /// Public freshness report for a batch id, as it appears in the URL
    BatchReport(String),
}

impl Route {
    /// Match a URL path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Landing),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["admin"] => Some(Route::Admin),
            ["profile"] => Some(Route::Profile),
            ["batch", id] => urlencoding::decode(id)
                .ok()
                .map(|id| Route::BatchReport(id.into_owned())),
            _ => None,
        }
    }

    /// Match the path of an absolute URL, such as a scanned code payload
    pub fn from_url(url: &Url) -> Option<Route> {
        Self::parse(url.path())
    }

    /// URL path of the route
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::BatchReport(id) => format!("/batch/{}", urlencoding::encode(id)),
        }
    }

    /// Views that require a signed-in user
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Admin | Route::Profile)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of entering a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The startup session probe has not settled; render nothing yet
    Pending,
    /// Render the requested view
    Allowed,
    /// Navigate to the given route instead
    Redirected(Route),
}

/// Gate in front of protected views. Nothing is cached between evaluations.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    /// Guard over `session`
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Decide whether `route` may be rendered right now
    pub fn evaluate(&self, route: &Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Allowed;
        }
        if self.session.is_resolving() {
            return GuardDecision::Pending;
        }
        if self.session.is_authenticated() {
            GuardDecision::Allowed
        } else {
            GuardDecision::Redirected(Route::Login)
        }
    }
}

/// Entry in the navigation bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Link { label: &'static str, route: Route },
    Logout,
}

/// Navigation entries for the current session
pub fn nav_links(session: &SessionStore) -> Vec<NavItem> {
    let home = NavItem::Link {
        label: "Freshness Tracker",
        route: Route::Landing,
    };
    if session.is_authenticated() {
        vec![
            home,
            NavItem::Link {
                label: "Admin Portal",
                route: Route::Admin,
            },
            NavItem::Link {
                label: "Profile",
                route: Route::Profile,
            },
            NavItem::Logout,
        ]
    } else {
        vec![
            home,
            NavItem::Link {
                label: "Sign In",
                route: Route::Login,
            },
            NavItem::Link {
                label: "Sign Up",
                route: Route::Register,
            },
        ]
    }
}
