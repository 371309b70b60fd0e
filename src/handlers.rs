use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

use crate::{
    AppState, NavigationState,
    auth::{AuthUser, CurrentSession},
    guard::GuardState,
    models::{
        MenuItem, NamespaceTable, NavigationView, Outcome, Resolution, RouteBinding, SessionView,
    },
    pages::RenderRequest,
    roles::Role,
};

// --- Query Structs ---

/// ResolveQuery
///
/// Query parameters for `GET /api/resolve`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ResolveQuery {
    /// Portal path to resolve, e.g. `/admin/fraud-engine`.
    pub path: String,
}

// --- API Handlers ---

/// resolve_route
///
/// [Public Route] Resolves a portal path for the calling session without
/// navigating: the client shell uses it to decide before changing location.
#[utoipa::path(
    get,
    path = "/api/resolve",
    params(ResolveQuery),
    responses((status = 200, description = "Resolution", body = Resolution))
)]
pub async fn resolve_route(
    CurrentSession(session): CurrentSession,
    State(navigation): State<NavigationState>,
    Query(query): Query<ResolveQuery>,
) -> Json<Resolution> {
    Json(navigation.resolve(&query.path, &session))
}

/// get_navigation
///
/// [Public Route] The navigation tree as visible to the caller: the public
/// subtree plus the namespaces the session may enter.
#[utoipa::path(
    get,
    path = "/api/navigation",
    responses((status = 200, description = "Visible navigation tree", body = NavigationView))
)]
pub async fn get_navigation(
    CurrentSession(session): CurrentSession,
    State(navigation): State<NavigationState>,
) -> Json<NavigationView> {
    Json(navigation.visible_to(&session))
}

/// get_session
///
/// [Public Route] The caller's session as the routing core sees it.
/// Anonymous callers get `is_authenticated = false`.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Session", body = SessionView))
)]
pub async fn get_session(
    CurrentSession(session): CurrentSession,
    State(navigation): State<NavigationState>,
) -> Json<SessionView> {
    let observation = navigation.guard().observe(&session, Utc::now());
    let (is_authenticated, role) = match observation.state {
        GuardState::Anonymous => (false, None),
        GuardState::Authenticated(role) => (true, Some(role)),
    };

    Json(SessionView {
        is_authenticated,
        role,
        user: session.user.clone().filter(|_| is_authenticated),
        home: navigation.home_for(&session),
    })
}

/// get_menu
///
/// [Authenticated Route] Sidebar entries for the caller's namespace.
#[utoipa::path(
    get,
    path = "/api/me/menu",
    responses(
        (status = 200, description = "Menu", body = [MenuItem]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_menu(
    AuthUser { session, .. }: AuthUser,
    State(navigation): State<NavigationState>,
) -> Json<Vec<MenuItem>> {
    Json(navigation.menu_for(&session))
}

/// get_namespaces
///
/// [Admin Route] Every assembled namespace with its full route table.
///
/// *Authorization*: evaluated by the same Route Guard as portal pages,
/// against a binding requiring `admin`.
#[utoipa::path(
    get,
    path = "/api/admin/namespaces",
    responses(
        (status = 200, description = "All namespaces", body = [NamespaceTable]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn get_namespaces(
    CurrentSession(session): CurrentSession,
    State(navigation): State<NavigationState>,
) -> Result<Json<Vec<NamespaceTable>>, StatusCode> {
    let gate = RouteBinding {
        path: "/api/admin/namespaces".to_string(),
        page: String::new(),
        label: "Namespaces".to_string(),
        required_roles: BTreeSet::from([navigation.guard().registry().canonical(Role::Admin)]),
    };

    match navigation.guard().authorize(&gate, &session).outcome {
        Outcome::Render => Ok(Json(navigation.namespace_tables())),
        Outcome::RedirectToLogin => Err(StatusCode::UNAUTHORIZED),
        Outcome::RedirectToUnauthorized => Err(StatusCode::FORBIDDEN),
    }
}

// --- Portal Fallback ---

/// render_portal
///
/// Every request not claimed by the API is a portal navigation:
///
/// * `Render` -> 200 with the page layer's HTML.
/// * `RedirectToLogin` / `RedirectToUnauthorized` -> 303 to the target.
/// * `NotFound` -> 404 with the not-found page, never a redirect.
/// * A page layer failure -> 500.
pub async fn render_portal(
    method: Method,
    uri: Uri,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let resolution = state.navigation.resolve(uri.path(), &session);
    debug!(uri = %uri, ?resolution, "portal navigation resolved");

    let (status, request) = match resolution {
        Resolution::Render { page, path, params } => (
            StatusCode::OK,
            RenderRequest {
                page,
                path,
                params,
                session,
            },
        ),
        Resolution::NotFound { page, path } => (
            StatusCode::NOT_FOUND,
            RenderRequest {
                page,
                path,
                params: Default::default(),
                session,
            },
        ),
        Resolution::RedirectToLogin { target, .. }
        | Resolution::RedirectToUnauthorized { target, .. } => {
            return Redirect::to(&target).into_response();
        }
    };

    let page = request.page.clone();
    match state.pages.render(request).await {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, %page, "page rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
