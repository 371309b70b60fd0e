use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Routing core.
pub mod error;
pub mod guard;
pub mod navigation;
pub mod navigator;
pub mod roles;
pub mod session;

// HTTP shell around the core.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pages;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AccessError, ConfigError, PageError};
pub use navigation::NavigationTree;
pub use pages::{PageRenderer, PageState, ShellPageRenderer};
pub use roles::{ResolvedRole, Role, RoleRegistry};

/// NavigationState
///
/// The assembled navigation tree, shared read-only by every request.
pub type NavigationState = Arc<NavigationTree>;

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// Portal page navigations are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::resolve_route, handlers::get_navigation, handlers::get_session,
        handlers::get_menu, handlers::get_namespaces
    ),
    components(
        schemas(
            models::RouteBinding, models::NamespaceTable, models::NavigationView,
            models::MenuItem, models::UserProfile, models::SessionView, models::Resolution,
            models::Outcome, models::AuthorizationDecision, roles::Role, roles::ResolvedRole,
            error::AccessError,
        )
    ),
    tags(
        (name = "csp-portal", description = "CSP Portal navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single container for everything a request needs: the navigation tree,
/// the page layer and the configuration. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub navigation: NavigationState,
    pub pages: PageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for NavigationState {
    fn from_ref(app_state: &AppState) -> NavigationState {
        app_state.navigation.clone()
    }
}

impl FromRef<AppState> for PageState {
    fn from_ref(app_state: &AppState) -> PageState {
        app_state.pages.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// build_navigation
///
/// Startup assembly: role registry (built-in plus configured aliases), then
/// the navigation tree for every canonical role. Any `ConfigError` here must
/// abort startup.
pub fn build_navigation(config: &AppConfig) -> Result<NavigationTree, ConfigError> {
    let registry = RoleRegistry::with_extra_aliases(config.role_aliases.iter().copied())?;
    NavigationTree::for_all_roles(registry)
}

/// create_router
///
/// Assembles the HTTP surface: JSON API routers, the portal fallback that
/// resolves every other path through the navigation tree, and the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Handlers there take `AuthUser`, which rejects anonymous callers with 401.
        .merge(authenticated::authenticated_routes())
        .nest("/api/admin", admin::admin_routes())
        // Everything else is a portal navigation.
        .fallback(handlers::render_portal)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
