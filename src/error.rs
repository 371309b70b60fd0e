use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::roles::Role;

/// ConfigError
///
/// Configuration defects detected while the portal is being assembled.
/// Every variant is fatal: the application refuses to start rather than
/// serving a navigation tree that could leak or lose routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The alias relation loops back on itself (including `a=a`).
    #[error("role alias cycle detected at '{role}'")]
    AliasCycle { role: Role },

    /// An alias entry was not of the form `alias=canonical`.
    #[error("invalid role alias entry: '{0}'")]
    InvalidAlias(String),

    /// A configured name is not part of the closed role set.
    #[error("unknown role name in configuration: '{0}'")]
    UnknownRoleName(String),

    /// Two namespaces claim the same root path.
    #[error("namespace root '{root}' is registered more than once")]
    DuplicateNamespace { root: String },

    /// One namespace root lies beneath another.
    #[error("namespace root '{inner}' overlaps '{outer}'")]
    OverlappingNamespace { outer: String, inner: String },

    /// A public path lands inside a role namespace, or a reserved path is missing.
    #[error("path '{path}' conflicts with the reserved routing layout")]
    ReservedPath { path: String },

    /// A route path could not be parsed.
    #[error("invalid route path '{path}'")]
    InvalidPath { path: String },

    /// A variable required for the current environment is not set.
    #[error("environment variable {0} must be set")]
    MissingVar(&'static str),
}

/// AccessError
///
/// Per-navigation failures. These never escape to the caller: the Route
/// Guard and the Navigation Assembler fold each one into an outcome and keep
/// it only as the `reason` attached to the decision.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
#[ts(export)]
pub enum AccessError {
    #[error("role '{0}' is not recognised")]
    UnknownRole(String),

    #[error("session could not be established as current")]
    StaleSession,

    #[error("no route matches '{0}'")]
    NoMatchingRoute(String),
}

/// PageError
///
/// The page layer could not produce a document. Answered with `500`.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page template failed to render: {0}")]
    Template(#[from] askama::Error),

    #[error("page params could not be encoded: {0}")]
    Params(#[from] serde_json::Error),
}
