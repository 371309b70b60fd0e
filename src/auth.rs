use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    NavigationState,
    config::{AppConfig, Env},
    guard::GuardState,
    models::{Session, UserProfile},
    roles::ResolvedRole,
};

/// Claims
///
/// Payload of the session JWT issued by the auth collaborator.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID.
    pub sub: Uuid,
    /// Raw role string. Only the role registry decides what it means.
    pub role: String,
    /// Optional display name shown by the page layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration Time (exp). Past this instant the session is stale.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// Header honoured in `Env::Local` only: authenticates the request as the given role.
pub const DEV_ROLE_HEADER: &str = "x-portal-role";

/// CurrentSession Extractor
///
/// Resolves the session for one request. It never rejects: a missing,
/// malformed or expired token simply yields the anonymous session, and the
/// Route Guard turns that into a login redirect where one is needed.
///
/// Token sources, in order:
/// 1. Local bypass: `x-portal-role` header (development only).
/// 2. `Authorization: Bearer <jwt>`.
/// 3. The configured session cookie.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(CurrentSession(session_from_parts(parts, &config)))
    }
}

/// session_from_parts
///
/// The extraction logic behind `CurrentSession`, usable outside an extractor.
pub fn session_from_parts(parts: &Parts, config: &AppConfig) -> Session {
    if config.env == Env::Local {
        if let Some(role) = header_str(parts, DEV_ROLE_HEADER) {
            debug!(%role, "local role bypass");
            return Session::authenticated(role, UserProfile::default());
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = bearer_token(parts).or_else(|| {
        jar.get(&config.session_cookie)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }) else {
        return Session::anonymous();
    };

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => {
            let claims = data.claims;
            let user = UserProfile {
                id: claims.sub,
                display_name: claims.name,
            };
            let session = Session::authenticated(claims.role, user);
            match DateTime::<Utc>::from_timestamp(claims.exp as i64, 0) {
                Some(expires_at) => session.expiring_at(expires_at),
                None => session,
            }
        }
        Err(e) => {
            match e.kind() {
                // Expired tokens are stale sessions, not errors.
                ErrorKind::ExpiredSignature => debug!("session token expired"),
                kind => debug!(?kind, "session token rejected"),
            }
            Session::anonymous()
        }
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    header_str(parts, header::AUTHORIZATION.as_str())?.strip_prefix("Bearer ")
}

/// AuthUser Extractor
///
/// For API routes that require *some* authenticated session. Rejects with
/// `401 Unauthorized` when the request resolves to the anonymous state.
/// The role may still be `Unknown`; role checks belong to the Route Guard.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: ResolvedRole,
    pub session: Session,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    NavigationState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let navigation = NavigationState::from_ref(state);
        let session = session_from_parts(parts, &config);

        match navigation.guard().observe(&session, Utc::now()).state {
            GuardState::Anonymous => Err(StatusCode::UNAUTHORIZED),
            GuardState::Authenticated(role) => Ok(AuthUser {
                id: session.user.as_ref().map(|user| user.id).unwrap_or_default(),
                role,
                session,
            }),
        }
    }
}
