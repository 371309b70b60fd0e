use crate::models::RouteBinding;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const NOT_FOUND_PAGE: &str = "system.not_found";

/// public_routes
///
/// The unauthenticated subtree. `/login` and `/unauthorized` must always be
/// present; the complaint and CSP verification forms are dual-exposed here
/// and inside the customer namespace.
pub fn public_routes() -> Vec<RouteBinding> {
    vec![
        RouteBinding::public("/", "public.landing", "Home"),
        RouteBinding::public("/about", "public.about", "About"),
        RouteBinding::public("/services", "public.services", "Services"),
        RouteBinding::public("/contact", "public.contact", "Contact"),
        RouteBinding::public("/file-complaint", "customer.complaint_form", "File a Complaint"),
        RouteBinding::public("/track-complaint", "customer.complaint_tracker", "Track Complaint"),
        RouteBinding::public("/verify-csp", "customer.csp_verification", "Verify a CSP"),
        RouteBinding::public(LOGIN_PATH, "auth.login", "Sign In"),
        RouteBinding::public(UNAUTHORIZED_PATH, "auth.unauthorized", "Access Denied"),
    ]
}
