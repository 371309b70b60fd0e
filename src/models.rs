use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AccessError,
    roles::{ResolvedRole, Role},
};

// --- Routing Schemas ---

/// RouteBinding
///
/// A `(path, page, required-role-set)` triple. An empty `required_roles`
/// set marks the route as public. Paths may contain `{param}` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteBinding {
    pub path: String,
    /// Identifier resolved by the page layer into a renderable unit.
    pub page: String,
    /// Human-readable menu label.
    pub label: String,
    /// Canonical roles allowed to render this route (already alias-resolved).
    pub required_roles: BTreeSet<Role>,
}

impl RouteBinding {
    pub fn public(path: &str, page: &str, label: &str) -> Self {
        Self {
            path: path.to_string(),
            page: page.to_string(),
            label: label.to_string(),
            required_roles: BTreeSet::new(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.required_roles.is_empty()
    }
}

/// NamespaceTable
///
/// One role namespace as exposed to clients: its root, the canonical role
/// owning it, the roles allowed in, and its ordered bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NamespaceTable {
    pub owner: Role,
    pub root: String,
    pub title: String,
    pub required_roles: BTreeSet<Role>,
    pub bindings: Vec<RouteBinding>,
}

/// NavigationView
///
/// The slice of the navigation tree a session may see: every public route
/// and the namespaces it is entitled to enter.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationView {
    pub public: Vec<RouteBinding>,
    pub namespaces: Vec<NamespaceTable>,
    /// Page rendered when nothing matches.
    pub not_found_page: String,
}

/// MenuItem
///
/// Sidebar entry for a role namespace (parameterized routes are omitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MenuItem {
    pub label: String,
    pub path: String,
}

// --- Session Schemas ---

/// UserProfile
///
/// Opaque profile carried by the session. The routing core never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: Option<String>,
}

/// Session
///
/// Observable authentication state owned by the auth collaborator. The raw
/// `role` string is kept as-is; it only becomes a `Role` through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Session {
    pub is_authenticated: bool,
    pub role: Option<String>,
    pub user: Option<UserProfile>,
    /// Instant after which the session must no longer be trusted.
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(role: impl Into<String>, user: UserProfile) -> Self {
        Self {
            is_authenticated: true,
            role: Some(role.into()),
            user: Some(user),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// An authenticated session past its expiry can no longer be trusted.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated && self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// SessionView
///
/// Output schema for `GET /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub is_authenticated: bool,
    pub role: Option<ResolvedRole>,
    pub user: Option<UserProfile>,
    /// Namespace root the session lands on after login, if any.
    pub home: Option<String>,
}

// --- Decision Schemas ---

/// Outcome
///
/// The three results the Route Guard can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Outcome {
    Render,
    RedirectToLogin,
    RedirectToUnauthorized,
}

/// AuthorizationDecision
///
/// Transient result of one guard evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorizationDecision {
    pub outcome: Outcome,
    /// Redirect location for the two redirect outcomes.
    pub target: Option<String>,
    /// Why access was not granted as requested, when relevant.
    pub reason: Option<AccessError>,
}

impl AuthorizationDecision {
    pub fn render() -> Self {
        Self {
            outcome: Outcome::Render,
            target: None,
            reason: None,
        }
    }

    pub fn is_render(&self) -> bool {
        self.outcome == Outcome::Render
    }
}

/// Resolution
///
/// Result of resolving a concrete URL against the whole navigation tree.
/// `NotFound` is distinct from every authorization outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum Resolution {
    Render {
        path: String,
        page: String,
        params: BTreeMap<String, String>,
    },
    RedirectToLogin {
        target: String,
        reason: Option<AccessError>,
    },
    RedirectToUnauthorized {
        target: String,
        reason: Option<AccessError>,
    },
    NotFound {
        path: String,
        page: String,
    },
}

impl Resolution {
    /// The page identifier to render, for `Render` and `NotFound`.
    pub fn page(&self) -> Option<&str> {
        match self {
            Resolution::Render { page, .. } | Resolution::NotFound { page, .. } => Some(page),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Resolution::RedirectToLogin { target, .. }
            | Resolution::RedirectToUnauthorized { target, .. } => Some(target),
            _ => None,
        }
    }
}
