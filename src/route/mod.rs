//! Route gate: maps (session status, requested path) to a resolution.
//!
//! | status          | path class | resolution        |
//! |-----------------|------------|-------------------|
//! | Unknown         | any        | Loading           |
//! | Unauthenticated | auth       | Render            |
//! | Unauthenticated | protected  | Redirect -> auth  |
//! | Authenticated   | auth       | Redirect -> home  |
//! | Authenticated   | protected  | Render            |
//! | known           | unmatched  | Redirect -> auth or home |

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::GateConfig;
use crate::error::GateError;
use crate::session::SessionStatus;

/// Logical screens the application routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Route {
    Auth,
    Home,
    Profile,
}

impl Route {
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Auth)
    }
}

/// Class of a requested path after matching against the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Auth,
    Protected(Route),
    /// Catch-all for anything not in the table.
    Unmatched,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Session not known yet: show the loading placeholder, never redirect.
    Loading,
    /// Render the screen at this (normalized) path.
    Render(String),
    /// Navigate to this path instead.
    Redirect(String),
}

impl Resolution {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Loading => None,
            Self::Render(path) | Self::Redirect(path) => Some(path),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Render(path) => write!(f, "render {path}"),
            Self::Redirect(path) => write!(f, "redirect -> {path}"),
        }
    }
}

/// Paths of the three routed screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub auth_path: String,
    pub home_path: String,
    pub profile_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            auth_path: "/auth".to_string(),
            home_path: "/home".to_string(),
            profile_path: "/user".to_string(),
        }
    }
}

impl RouteTable {
    pub fn path(&self, route: Route) -> &str {
        match route {
            Route::Auth => &self.auth_path,
            Route::Home => &self.home_path,
            Route::Profile => &self.profile_path,
        }
    }

    /// Check every path is absolute and the three screens are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Configuration`] naming the offending path.
    pub fn validate(&self) -> Result<(), GateError> {
        let paths = [&self.auth_path, &self.home_path, &self.profile_path];
        for path in paths {
            if !path.trim().starts_with('/') {
                return Err(GateError::Configuration(format!(
                    "route path must start with '/': {path:?}"
                )));
            }
        }
        let normalized: Vec<String> = paths.iter().map(|p| normalize_path(p)).collect();
        for (i, path) in normalized.iter().enumerate() {
            if normalized[..i].contains(path) {
                return Err(GateError::Configuration(format!(
                    "route path is used by more than one screen: {path:?}"
                )));
            }
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        Self {
            auth_path: normalize_path(&self.auth_path),
            home_path: normalize_path(&self.home_path),
            profile_path: normalize_path(&self.profile_path),
        }
    }
}

/// Pure decision function from session status and path to a [`Resolution`].
///
/// # Example
/// ```
/// use sessiongate::route::{Resolution, RouteGate};
/// use sessiongate::session::SessionStatus;
///
/// let gate = RouteGate::default();
/// assert_eq!(
///     gate.resolve(&SessionStatus::Unauthenticated, "/home"),
///     Resolution::Redirect("/auth".to_string()),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RouteGate {
    routes: RouteTable,
    require_verified_email: bool,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::new(RouteTable::default())
    }
}

impl RouteGate {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: routes.normalized(),
            require_verified_email: true,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.routes.clone())
            .with_verified_email_required(config.policy.require_verified_email)
    }

    /// When set, an authenticated but unverified identity navigates as if
    /// signed out.
    pub fn with_verified_email_required(mut self, required: bool) -> Self {
        self.require_verified_email = required;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn classify(&self, requested_path: &str) -> PathClass {
        let path = normalize_path(requested_path);
        match Route::iter().find(|route| self.routes.path(*route) == path) {
            Some(route) if route.is_protected() => PathClass::Protected(route),
            Some(_) => PathClass::Auth,
            None => PathClass::Unmatched,
        }
    }

    /// `None` while unknown, otherwise whether the status counts as signed
    /// in for navigation.
    pub fn signed_in_for_navigation(&self, status: &SessionStatus) -> Option<bool> {
        match status {
            SessionStatus::Unknown => None,
            SessionStatus::Unauthenticated => Some(false),
            SessionStatus::Authenticated(identity) => {
                Some(!self.require_verified_email || identity.email_verified)
            }
        }
    }

    pub fn resolve(&self, status: &SessionStatus, requested_path: &str) -> Resolution {
        let Some(signed_in) = self.signed_in_for_navigation(status) else {
            return Resolution::Loading;
        };
        let auth = || Resolution::Redirect(self.routes.auth_path.clone());
        let home = || Resolution::Redirect(self.routes.home_path.clone());

        match (signed_in, self.classify(requested_path)) {
            (false, PathClass::Auth) => Resolution::Render(self.routes.auth_path.clone()),
            (false, PathClass::Protected(_) | PathClass::Unmatched) => auth(),
            (true, PathClass::Auth | PathClass::Unmatched) => home(),
            (true, PathClass::Protected(route)) => {
                Resolution::Render(self.routes.path(route).to_string())
            }
        }
    }

    /// Where a status lands when no particular path is requested.
    pub fn landing(&self, status: &SessionStatus) -> Resolution {
        match self.signed_in_for_navigation(status) {
            None => Resolution::Loading,
            Some(false) => Resolution::Render(self.routes.auth_path.clone()),
            Some(true) => Resolution::Render(self.routes.home_path.clone()),
        }
    }

    /// The navigation bar is only shown to identities that may navigate
    /// the protected screens.
    pub fn navbar_visible(&self, status: &SessionStatus) -> bool {
        self.signed_in_for_navigation(status) == Some(true)
    }
}

/// Drop query and fragment, trailing slashes and ASCII case.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');
    let path = path.to_ascii_lowercase();
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
