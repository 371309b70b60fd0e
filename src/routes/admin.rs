use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Diagnostics restricted to the `admin` role. The role check runs inside
/// the handler through the Route Guard, so aliases of `admin` pass as well.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/namespaces
        // Full route tables of every assembled namespace.
        .route("/namespaces", get(handlers::get_namespaces))
}
