use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use csp_portal::{
    AppState, ResolvedRole, Role, ShellPageRenderer, build_navigation,
    auth::{AuthUser, Claims, CurrentSession, DEV_ROLE_HEADER, session_from_parts},
    config::{AppConfig, Env},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Token for `role` expiring `exp_offset` seconds from now (negative: already expired).
fn create_token(role: &str, exp_offset: i64, secret: &str) -> String {
    let now = now_secs();
    let claims = Claims {
        sub: TEST_USER_ID,
        role: role.to_string(),
        name: Some("Test User".to_string()),
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        navigation: Arc::new(build_navigation(&config).unwrap()),
        pages: Arc::new(ShellPageRenderer::default()),
        config,
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(mut parts: Parts, token: &str) -> Parts {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

// --- Session extraction ---

#[tokio::test]
async fn test_session_from_valid_bearer_token() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("admin", 3600, TEST_JWT_SECRET);
    let mut parts = with_bearer(get_request_parts(Method::GET, "/admin".parse().unwrap()), &token);

    let CurrentSession(session) = CurrentSession::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(session.is_authenticated);
    assert_eq!(session.role.as_deref(), Some("admin"));
    let user = session.user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.display_name.as_deref(), Some("Test User"));
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn test_session_from_cookie() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("customer", 3600, TEST_JWT_SECRET);
    let mut parts = get_request_parts(Method::GET, "/customer".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("theme=dark; portal_token={}", token)).unwrap(),
    );

    let session = session_from_parts(&parts, &app_state.config);

    assert!(session.is_authenticated);
    assert_eq!(session.role.as_deref(), Some("customer"));
}

#[tokio::test]
async fn test_similarly_named_cookie_is_ignored() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("admin", 3600, TEST_JWT_SECRET);
    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("portal_token_old={}; xportal_token={}", token, token))
            .unwrap(),
    );

    assert!(!session_from_parts(&parts, &app_state.config).is_authenticated);
}

#[tokio::test]
async fn test_empty_session_cookie_is_anonymous() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts
        .headers
        .insert(header::COOKIE, header::HeaderValue::from_static("portal_token="));

    assert!(!session_from_parts(&parts, &app_state.config).is_authenticated);
}

#[tokio::test]
async fn test_expired_token_yields_anonymous_session() {
    let app_state = create_app_state(Env::Production);
    // Past the default validation leeway.
    let token = create_token("admin", -600, TEST_JWT_SECRET);
    let parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), &token);

    let session = session_from_parts(&parts, &app_state.config);

    assert!(!session.is_authenticated);
    assert_eq!(session.role, None);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_ignored() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("admin", 3600, "some-other-secret");
    let parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), &token);

    assert!(!session_from_parts(&parts, &app_state.config).is_authenticated);
}

#[tokio::test]
async fn test_garbage_token_is_ignored() {
    let app_state = create_app_state(Env::Production);
    let parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), "not.a.jwt");

    assert!(!session_from_parts(&parts, &app_state.config).is_authenticated);
}

// --- AuthUser ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("auditor", 3600, TEST_JWT_SECRET);
    let mut parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, ResolvedRole::Known(Role::FieldAuditor));
}

#[tokio::test]
async fn test_auth_with_unknown_role_is_still_authenticated() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("superuser", 3600, TEST_JWT_SECRET);
    let mut parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), &token);

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(user.role, ResolvedRole::Unknown);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let app_state = create_app_state(Env::Production);
    let token = create_token("admin", -600, TEST_JWT_SECRET);
    let mut parts = with_bearer(get_request_parts(Method::GET, "/".parse().unwrap()), &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

// --- Local bypass ---

#[tokio::test]
async fn test_local_bypass_success() {
    let app_state = create_app_state(Env::Local);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(DEV_ROLE_HEADER),
        header::HeaderValue::from_static("bank_officer"),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(user.role, ResolvedRole::Known(Role::BankOfficer));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(DEV_ROLE_HEADER),
        header::HeaderValue::from_static("admin"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}
