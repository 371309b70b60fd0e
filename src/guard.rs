use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    error::AccessError,
    models::{AuthorizationDecision, Outcome, RouteBinding, Session},
    navigation::public::{LOGIN_PATH, UNAUTHORIZED_PATH},
    roles::{ResolvedRole, RoleRegistry},
};

/// GuardState
///
/// What the guard knows about the requester. Transitions between the two
/// states are driven by the session owner; the guard only observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Anonymous,
    Authenticated(ResolvedRole),
}

/// Observation
///
/// A `GuardState` together with the access problem found while deriving it
/// (unknown role string, stale session), kept for the decision's `reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub state: GuardState,
    pub reason: Option<AccessError>,
}

impl Observation {
    pub fn anonymous() -> Self {
        Self {
            state: GuardState::Anonymous,
            reason: None,
        }
    }

    /// A session whose freshness could not be established: treated as anonymous.
    pub fn stale() -> Self {
        Self {
            state: GuardState::Anonymous,
            reason: Some(AccessError::StaleSession),
        }
    }
}

/// RouteGuard
///
/// Maps `(route, session)` to one of `Render`, `RedirectToLogin` or
/// `RedirectToUnauthorized`. Every per-navigation problem is folded into one
/// of those outcomes; nothing is returned as an error.
///
/// The required-role-set of a route is taken as-is: alias expansion happened
/// when the route table was built, only the session role is resolved here.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    registry: RoleRegistry,
    login_path: String,
    unauthorized_path: String,
}

impl RouteGuard {
    pub fn new(registry: RoleRegistry) -> Self {
        Self {
            registry,
            login_path: LOGIN_PATH.to_string(),
            unauthorized_path: UNAUTHORIZED_PATH.to_string(),
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// observe
    ///
    /// Derives the guard state from a session snapshot at instant `now`.
    /// Expired sessions are stale and count as anonymous; an authenticated
    /// session without a resolvable role is `Authenticated(Unknown)`.
    pub fn observe(&self, session: &Session, now: DateTime<Utc>) -> Observation {
        if !session.is_authenticated {
            return Observation::anonymous();
        }
        if session.is_expired_at(now) {
            debug!("session expired, treating requester as anonymous");
            return Observation::stale();
        }

        let raw = session.role.as_deref().unwrap_or_default();
        match self.registry.resolve_role(raw) {
            ResolvedRole::Known(role) => Observation {
                state: GuardState::Authenticated(ResolvedRole::Known(role)),
                reason: None,
            },
            ResolvedRole::Unknown => Observation {
                state: GuardState::Authenticated(ResolvedRole::Unknown),
                reason: Some(AccessError::UnknownRole(raw.to_string())),
            },
        }
    }

    /// authorize
    ///
    /// Decision for a route requested at its own path, evaluated now.
    pub fn authorize(&self, route: &RouteBinding, session: &Session) -> AuthorizationDecision {
        self.authorize_at(route, &route.path, session, Utc::now())
    }

    /// Decision for `route` matched from the concrete `requested_path`.
    pub fn authorize_at(
        &self,
        route: &RouteBinding,
        requested_path: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> AuthorizationDecision {
        let observation = self.observe(session, now);
        self.decide(route, requested_path, &observation)
    }

    /// decide
    ///
    /// 1. Public route: `Render`, whatever the session.
    /// 2. Anonymous: `RedirectToLogin`, carrying the requested path for resumption.
    /// 3. Resolved role in the required set: `Render`; anything else,
    ///    including `Unknown`, is `RedirectToUnauthorized`.
    pub fn decide(
        &self,
        route: &RouteBinding,
        requested_path: &str,
        observation: &Observation,
    ) -> AuthorizationDecision {
        if route.is_public() {
            return AuthorizationDecision::render();
        }

        match observation.state {
            GuardState::Anonymous => AuthorizationDecision {
                outcome: Outcome::RedirectToLogin,
                target: Some(self.login_redirect(requested_path)),
                reason: observation.reason.clone(),
            },
            GuardState::Authenticated(ResolvedRole::Known(role))
                if route.required_roles.contains(&role) =>
            {
                AuthorizationDecision::render()
            }
            GuardState::Authenticated(resolved) => {
                if resolved == ResolvedRole::Unknown {
                    warn!(path = %requested_path, "denying session with unrecognised role");
                } else {
                    debug!(path = %requested_path, ?resolved, "role not entitled to route");
                }
                AuthorizationDecision {
                    outcome: Outcome::RedirectToUnauthorized,
                    target: Some(self.unauthorized_path.clone()),
                    reason: observation.reason.clone(),
                }
            }
        }
    }

    /// `/login?next=<requested path>`; the bare login path when the request was for it.
    pub fn login_redirect(&self, requested_path: &str) -> String {
        if requested_path == self.login_path || requested_path == "/" {
            return self.login_path.clone();
        }
        format!(
            "{}?next={}",
            self.login_path,
            urlencoding::encode(requested_path)
        )
    }
}
