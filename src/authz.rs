//! Navigation authorization, kept independent of the web framework.
//!
//! Every navigable path maps to an access requirement, and
//! [`decide`] turns (path, session role) into a tagged allow/redirect
//! decision. The role request guards in [`crate::auth`] and the
//! `/session/route-decision` endpoint both go through this module, so route
//! policy lives in exactly one place.

use crate::models::user::Role;
use rocket::serde::Serialize;
use schemars::JsonSchema;

/// What a path demands before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No session required.
    Public,
    /// The root path: never renders, always forwards somewhere.
    Root,
    /// Login/register: only reachable while signed out.
    Entry,
    /// Any authenticated session.
    RequiresSession,
    /// A session with this exact role.
    RequiresRole(Role),
    /// Not part of the route table.
    Unknown,
}

/// Outcome of an access check, serialized as a tagged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectToUnauthorized,
    RedirectToRoleHome { role: Role },
    NotFound,
}

impl AccessDecision {
    /// Target path for redirect decisions; None for allow/not-found.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allow | AccessDecision::NotFound => None,
            AccessDecision::RedirectToLogin => Some("/login"),
            AccessDecision::RedirectToUnauthorized => Some("/unauthorized"),
            AccessDecision::RedirectToRoleHome { role } => Some(role.home_path()),
        }
    }
}

/// The route table of the application.
pub fn classify(path: &str) -> RouteAccess {
    match path {
        "/" => RouteAccess::Root,
        "/login" | "/register" => RouteAccess::Entry,
        "/unauthorized" => RouteAccess::Public,
        "/customer" | "/create-appointment" => RouteAccess::RequiresRole(Role::Customer),
        "/admin" => RouteAccess::RequiresRole(Role::Admin),
        _ if path.strip_prefix("/download/").is_some_and(|id| !id.is_empty() && !id.contains('/')) => RouteAccess::RequiresSession,
        _ => RouteAccess::Unknown,
    }
}

/// Evaluate one navigation request against the current session.
pub fn decide(path: &str, session: Option<Role>) -> AccessDecision {
    match classify(path) {
        RouteAccess::Public => AccessDecision::Allow,
        RouteAccess::Root => match session {
            Some(role) => AccessDecision::RedirectToRoleHome { role },
            None => AccessDecision::RedirectToLogin,
        },
        RouteAccess::Entry => match session {
            Some(role) => AccessDecision::RedirectToRoleHome { role },
            None => AccessDecision::Allow,
        },
        RouteAccess::RequiresSession => match session {
            Some(_) => AccessDecision::Allow,
            None => AccessDecision::RedirectToLogin,
        },
        RouteAccess::RequiresRole(required) => match session {
            None => AccessDecision::RedirectToLogin,
            Some(role) => check_role(role, required),
        },
        RouteAccess::Unknown => AccessDecision::NotFound,
    }
}

/// Role check shared with the request guards.
pub fn check_role(session: Role, required: Role) -> AccessDecision {
    if session == required {
        AccessDecision::Allow
    } else {
        AccessDecision::RedirectToUnauthorized
    }
}
