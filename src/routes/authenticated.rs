use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler takes the `AuthUser` extractor, so an anonymous (or
/// expired) session is rejected with `401` before the handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me/menu
        // Sidebar entries for the caller's namespace.
        .route("/api/me/menu", get(handlers::get_menu))
}
