//! Route guard: maps an auth snapshot and a requested route to what renders.
//!
//! DESIGN
//! ======
//! The guard holds no state of its own. `resolve` is a pure function of the
//! published `AuthSnapshot`, so every navigation re-evaluates from the store.
//! While the initial resolution is in flight every route renders the
//! resolving screen; no redirect is decided until `loading` clears.

use std::fmt;

use crate::net::types::{ProfileType, User};
use crate::store::AuthSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    AddPatient,
    Patient(String),
    /// Anything unmatched; redirects to the dashboard or login.
    Unknown(String),
}

impl Route {
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        match trimmed {
            "/login" => Self::Login,
            "/register" => Self::Register,
            "" | "/dashboard" => Self::Dashboard,
            "/add-patient" => Self::AddPatient,
            other => match other.strip_prefix("/patient/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Self::Patient(id.to_owned()),
                _ => Self::Unknown(path.to_owned()),
            },
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".into(),
            Self::Register => "/register".into(),
            Self::Dashboard => "/dashboard".into(),
            Self::AddPatient => "/add-patient".into(),
            Self::Patient(id) => format!("/patient/{id}"),
            Self::Unknown(path) => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Guardian,
    Professional,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Resolving,
    Login,
    Register,
    Dashboard(Dashboard),
    AddPatient,
    Patient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Page),
    Redirect(Route),
}

/// Login and register: an authenticated user is sent to the dashboard.
#[must_use]
pub fn public_route(user: Option<&User>, page: Page) -> RouteDecision {
    match user {
        Some(_) => RouteDecision::Redirect(Route::Dashboard),
        None => RouteDecision::Render(page),
    }
}

/// Protected pages: without a user, redirect to login.
pub fn protected_route(user: Option<&User>, page: impl FnOnce(&User) -> Page) -> RouteDecision {
    match user {
        Some(user) => RouteDecision::Render(page(user)),
        None => RouteDecision::Redirect(Route::Login),
    }
}

#[must_use]
pub fn dashboard_for(user: &User) -> Dashboard {
    match user.profile_type {
        ProfileType::Guardian => Dashboard::Guardian,
        ProfileType::Professional => Dashboard::Professional,
        ProfileType::Organization => Dashboard::Organization,
    }
}

#[must_use]
pub fn resolve(snapshot: &AuthSnapshot, route: &Route) -> RouteDecision {
    if snapshot.loading {
        return RouteDecision::Render(Page::Resolving);
    }
    let user = snapshot.user.as_ref();
    match route {
        Route::Login => public_route(user, Page::Login),
        Route::Register => public_route(user, Page::Register),
        Route::Dashboard => protected_route(user, |u| Page::Dashboard(dashboard_for(u))),
        Route::AddPatient => protected_route(user, |_| Page::AddPatient),
        Route::Patient(id) => protected_route(user, |_| Page::Patient(id.clone())),
        Route::Unknown(_) => RouteDecision::Redirect(if user.is_some() { Route::Dashboard } else { Route::Login }),
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
