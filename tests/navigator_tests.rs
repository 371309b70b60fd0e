use std::sync::Arc;

use csp_portal::{
    AccessError, NavigationTree, RoleRegistry,
    models::{Resolution, Session, UserProfile},
    navigator::Navigator,
    session::{SessionOracle, SessionSnapshot, WatchSessionOracle},
};
use tokio::sync::watch;

fn tree() -> Arc<NavigationTree> {
    Arc::new(NavigationTree::for_all_roles(RoleRegistry::default()).unwrap())
}

fn signed_in(role: &str) -> Session {
    Session::authenticated(role, UserProfile::default())
}

/// Oracle that publishes whatever version it is told to, including older ones.
struct ReplayOracle {
    sender: watch::Sender<SessionSnapshot>,
}

impl ReplayOracle {
    fn new(version: u64, session: Session) -> Self {
        let (sender, _) = watch::channel(SessionSnapshot { version, session });
        Self { sender }
    }

    fn publish(&self, version: u64, session: Session) {
        self.sender.send_replace(SessionSnapshot { version, session });
    }
}

impl SessionOracle for ReplayOracle {
    fn current_session(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.sender.subscribe()
    }
}

#[tokio::test]
async fn test_login_resumes_the_requested_page() {
    let oracle = Arc::new(WatchSessionOracle::new());
    let mut navigator = Navigator::new(tree(), oracle.clone());

    let first = navigator.navigate("/admin/fraud-engine");
    assert!(matches!(first, Resolution::RedirectToLogin { .. }));
    assert_eq!(navigator.location(), Some("/login"));
    assert_eq!(navigator.pending_return(), Some("/admin/fraud-engine"));

    oracle.sign_in(signed_in("admin"));
    let resumed = navigator.session_changed().await.unwrap();

    assert_eq!(resumed.page(), Some("admin.fraud_engine"));
    assert_eq!(navigator.location(), Some("/admin/fraud-engine"));
    assert_eq!(navigator.pending_return(), None);
}

#[tokio::test]
async fn test_login_for_the_wrong_role_lands_on_home() {
    let oracle = Arc::new(WatchSessionOracle::new());
    let mut navigator = Navigator::new(tree(), oracle.clone());

    navigator.navigate("/admin/users");
    oracle.sign_in(signed_in("csp_agent"));
    let resumed = navigator.session_changed().await.unwrap();

    assert_eq!(resumed.page(), Some("csp.dashboard"));
    assert_eq!(navigator.location(), Some("/csp"));
}

#[tokio::test]
async fn test_login_from_login_page_goes_home() {
    let oracle = Arc::new(WatchSessionOracle::new());
    let mut navigator = Navigator::new(tree(), oracle.clone());

    assert_eq!(navigator.navigate("/login").page(), Some("auth.login"));

    oracle.sign_in(signed_in("hr"));
    let landed = navigator.session_changed().await.unwrap();

    assert_eq!(landed.page(), Some("hr.dashboard"));
}

#[tokio::test]
async fn test_navigation_after_logout_uses_the_new_session() {
    let oracle = Arc::new(WatchSessionOracle::new());
    oracle.sign_in(signed_in("admin"));
    let mut navigator = Navigator::new(tree(), oracle.clone());

    assert_eq!(navigator.navigate("/admin").page(), Some("admin.dashboard"));

    oracle.sign_out();
    // Issued after the logout: must never render with the old session.
    let after = navigator.navigate("/admin");

    assert!(matches!(after, Resolution::RedirectToLogin { .. }));
    assert_eq!(navigator.pending_return(), Some("/admin"));
}

#[tokio::test]
async fn test_logout_reevaluates_current_location() {
    let oracle = Arc::new(WatchSessionOracle::new());
    let mut navigator = Navigator::new(tree(), oracle.clone());

    oracle.sign_in(signed_in("customer"));
    navigator.session_changed().await.unwrap();
    navigator.navigate("/customer/accounts");

    oracle.expire();
    let after = navigator.session_changed().await.unwrap();

    assert_eq!(
        after.redirect_target(),
        Some("/login?next=%2Fcustomer%2Faccounts")
    );
    assert_eq!(navigator.location(), Some("/login"));
}

#[tokio::test]
async fn test_public_location_survives_session_changes() {
    let oracle = Arc::new(WatchSessionOracle::new());
    let mut navigator = Navigator::new(tree(), oracle.clone());

    navigator.navigate("/verify-csp");
    oracle.sign_in(signed_in("bank_officer"));
    let after_login = navigator.session_changed().await.unwrap();
    oracle.sign_out();
    let after_logout = navigator.session_changed().await.unwrap();

    assert_eq!(after_login.page(), Some("customer.csp_verification"));
    assert_eq!(after_logout, after_login);
}

#[tokio::test]
async fn test_oracle_versions_increase_per_transition() {
    let oracle = WatchSessionOracle::new();
    assert_eq!(oracle.current_session().version, 0);

    oracle.sign_in(signed_in("hr"));
    oracle.sign_out();

    let snapshot = oracle.current_session();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.session, Session::anonymous());
}

#[tokio::test]
async fn test_older_snapshot_is_treated_as_stale() {
    let oracle = Arc::new(ReplayOracle::new(5, signed_in("admin")));
    let mut navigator = Navigator::new(tree(), oracle.clone());

    assert!(matches!(navigator.navigate("/admin"), Resolution::Render { .. }));

    oracle.publish(3, signed_in("admin"));
    let replayed = navigator.navigate("/admin");

    assert_eq!(
        replayed,
        Resolution::RedirectToLogin {
            target: "/login?next=%2Fadmin".to_string(),
            reason: Some(AccessError::StaleSession),
        }
    );
}
