use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. Session-aware handlers here answer
/// for the anonymous state instead of rejecting.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/resolve?path=...
        // Render / redirect / not-found decision for a path, without navigating.
        .route("/api/resolve", get(handlers::resolve_route))
        // GET /api/navigation
        // Public subtree plus the namespaces the caller may enter.
        .route("/api/navigation", get(handlers::get_navigation))
        // GET /api/session
        .route("/api/session", get(handlers::get_session))
}
