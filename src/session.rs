use tokio::sync::watch;
use tracing::info;

use crate::models::Session;

/// SessionSnapshot
///
/// A session value tagged with the oracle version it was published at.
/// Versions increase by one on every transition and never go backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub version: u64,
    pub session: Session,
}

/// SessionOracle
///
/// The narrow read + subscribe interface through which the routing core
/// observes authentication state. The core never mutates the session.
pub trait SessionOracle: Send + Sync {
    /// Synchronous read of the latest published session.
    fn current_session(&self) -> SessionSnapshot;

    /// Change notifications. A receiver always observes the latest value, so a
    /// navigation evaluated after a transition can never see the older session.
    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;
}

/// WatchSessionOracle
///
/// Process-wide session state with an explicit lifecycle: populated by
/// `sign_in`, cleared by `sign_out` or `expire`. Backed by a `tokio::sync::watch`
/// channel, which publishes each value before any later read can happen.
#[derive(Debug)]
pub struct WatchSessionOracle {
    sender: watch::Sender<SessionSnapshot>,
}

impl Default for WatchSessionOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSessionOracle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot {
            version: 0,
            session: Session::anonymous(),
        });
        Self { sender }
    }

    /// Login completed: publish the authenticated session.
    pub fn sign_in(&self, session: Session) {
        info!(role = ?session.role, "session signed in");
        self.publish(session);
    }

    /// Logout: publish the anonymous session.
    pub fn sign_out(&self) {
        info!("session signed out");
        self.publish(Session::anonymous());
    }

    /// Token expiry observed by the auth collaborator.
    pub fn expire(&self) {
        info!("session expired");
        self.publish(Session::anonymous());
    }

    fn publish(&self, session: Session) {
        self.sender.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.session = session;
        });
    }
}

impl SessionOracle for WatchSessionOracle {
    fn current_session(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.sender.subscribe()
    }
}
