use std::env;

use crate::{
    error::ConfigError,
    roles::{Role, parse_aliases},
};

/// AppConfig
///
/// Holds the portal's entire configuration. Immutable once loaded and pulled
/// into handlers via `FromRef`, next to the navigation tree and page layer.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the development role bypass and log format.
    pub env: Env,
    // Secret used to validate incoming session JWTs (HS256).
    pub jwt_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Cookie carrying the session token for browser navigations.
    pub session_cookie: String,
    // Extra `alias -> canonical` pairs on top of the built-in `auditor -> field_auditor`.
    pub role_aliases: Vec<(Role, Role)>,
}

/// Env
///
/// Local enables the `x-portal-role` bypass and pretty logs; Production
/// requires real secrets and emits JSON logs.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "local-portal-secret-do-not-use-in-production";

impl Default for AppConfig {
    /// Safe values for tests: no environment variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_cookie: "portal_token".to_string(),
            role_aliases: Vec::new(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    /// * `MissingVar` when `PORTAL_JWT_SECRET` is absent in production.
    /// * Alias parsing errors from `PORTAL_ROLE_ALIASES`. Cycles are caught
    ///   later, when the role registry is built at startup.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (&env, env::var("PORTAL_JWT_SECRET")) {
            (_, Ok(secret)) => secret,
            (Env::Production, Err(_)) => return Err(ConfigError::MissingVar("PORTAL_JWT_SECRET")),
            (Env::Local, Err(_)) => LOCAL_JWT_SECRET.to_string(),
        };

        let role_aliases = match env::var("PORTAL_ROLE_ALIASES") {
            Ok(raw) => parse_aliases(&raw)?,
            Err(_) => Vec::new(),
        };

        let defaults = Self::default();
        Ok(Self {
            env,
            jwt_secret,
            bind_addr: env::var("PORTAL_BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_cookie: env::var("PORTAL_SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            role_aliases,
        })
    }
}
