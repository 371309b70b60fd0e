use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    guard::Observation,
    models::Resolution,
    navigation::{
        NavigationTree,
        path::normalize_path,
        public::LOGIN_PATH,
    },
    session::{SessionOracle, SessionSnapshot},
};

/// Navigator
///
/// Client-side navigation driver. Each `navigate` reads the session oracle at
/// evaluation time, so a navigation issued after a logout is never judged
/// against the pre-logout session. `session_changed` waits for the next
/// transition and re-evaluates the current location, resuming the path that
/// triggered a login redirect once the session becomes authenticated.
pub struct Navigator<O: SessionOracle> {
    tree: Arc<NavigationTree>,
    oracle: Arc<O>,
    changes: watch::Receiver<SessionSnapshot>,
    location: Option<String>,
    pending_return: Option<String>,
    last_version: u64,
}

impl<O: SessionOracle> Navigator<O> {
    pub fn new(tree: Arc<NavigationTree>, oracle: Arc<O>) -> Self {
        let mut changes = oracle.subscribe();
        let last_version = changes.borrow_and_update().version;
        Self {
            tree,
            oracle,
            changes,
            location: None,
            pending_return: None,
            last_version,
        }
    }

    /// Current location after the last resolution (redirects included).
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Path to resume after login, if a login redirect is outstanding.
    pub fn pending_return(&self) -> Option<&str> {
        self.pending_return.as_deref()
    }

    pub fn navigate(&mut self, path: &str) -> Resolution {
        let snapshot = self.oracle.current_session();
        let observation = self.observe(&snapshot);
        let resolution = self.tree.resolve_observed(path, &observation);
        self.record(path, &resolution);
        resolution
    }

    /// Waits for the next session transition, then re-evaluates.
    /// Returns `None` once the oracle has been dropped.
    pub async fn session_changed(&mut self) -> Option<Resolution> {
        self.changes.changed().await.ok()?;
        self.changes.borrow_and_update();
        Some(self.reevaluate())
    }

    /// reevaluate
    ///
    /// Re-resolves against the latest session. After a login the pending
    /// return path wins, then the role's home when still parked on `/login`.
    pub fn reevaluate(&mut self) -> Resolution {
        let session = self.oracle.current_session().session;
        let current = self.location.clone().unwrap_or_else(|| "/".to_string());

        let target = if session.is_authenticated {
            match self.pending_return.take() {
                Some(pending) => self.tree.post_login_target(Some(&pending), &session),
                None if current == LOGIN_PATH => self.tree.post_login_target(None, &session),
                None => current,
            }
        } else {
            current
        };

        debug!(%target, "re-evaluating after session change");
        self.navigate(&target)
    }

    fn observe(&mut self, snapshot: &SessionSnapshot) -> Observation {
        if snapshot.version < self.last_version {
            warn!(
                seen = self.last_version,
                got = snapshot.version,
                "session snapshot older than last observed"
            );
            return Observation::stale();
        }
        self.last_version = snapshot.version;
        self.tree.guard().observe(&snapshot.session, Utc::now())
    }

    fn record(&mut self, requested: &str, resolution: &Resolution) {
        self.location = Some(match resolution {
            Resolution::Render { path, .. } | Resolution::NotFound { path, .. } => path.clone(),
            Resolution::RedirectToLogin { .. } => {
                self.pending_return = Some(normalize_path(requested));
                LOGIN_PATH.to_string()
            }
            Resolution::RedirectToUnauthorized { target, .. } => normalize_path(target),
        });
    }
}
