//! Route guard
//!
//! Stateless, re-evaluated on every navigation. Only cookie presence and the
//! role marker's value are consulted; token validity is the backend's
//! business when the token is actually used.

use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::credentials::{CookieJar, CredentialStore};

pub const HOME: &str = "/";
pub const DASHBOARD: &str = "/dashboard";

const AUTH_PREFIXES: &[&str] = &["/signin", "/reset-password"];
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/users", "/black-lists"];
const ADMIN_PREFIXES: &[&str] = &["/black-lists"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Landing, sign-in and reset pages
    Auth,
    Protected,
    /// Protected and additionally admin-only
    Admin,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(&'static str),
}

/// `/users` matches `/users` and `/users/5`, not `/usersettings`
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn classify(path: &str) -> PathClass {
    if path == HOME || AUTH_PREFIXES.iter().any(|p| under(path, p)) {
        PathClass::Auth
    } else if ADMIN_PREFIXES.iter().any(|p| under(path, p)) {
        PathClass::Admin
    } else if PROTECTED_PREFIXES.iter().any(|p| under(path, p)) {
        PathClass::Protected
    } else {
        PathClass::Other
    }
}

/// Decide a navigation from the path and the raw cookie values.
/// Empty cookie values count as absent.
pub fn evaluate(path: &str, token: Option<&str>, role: Option<&str>) -> GuardDecision {
    let signed_in = token.is_some_and(|t| !t.is_empty());
    match classify(path) {
        PathClass::Auth if signed_in => GuardDecision::Redirect(DASHBOARD),
        PathClass::Protected | PathClass::Admin if !signed_in => GuardDecision::Redirect(HOME),
        PathClass::Admin if role != Some("admin") => GuardDecision::Redirect(DASHBOARD),
        _ => GuardDecision::Pass,
    }
}

/// axum middleware: runs [`evaluate`] against the request's cookies.
///
/// Page loads get a 307. Anything else (form posts) gets a 303 so the
/// browser follows up with a GET instead of replaying the post.
pub async fn route_guard(request: Request<Body>, next: Next) -> Response {
    let cookies = CookieJar::from_headers(request.headers());
    let path = request.uri().path().to_string();
    match evaluate(
        &path,
        cookies.token().as_deref(),
        cookies.role_marker().as_deref(),
    ) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!("Guard: {} {} -> {}", request.method(), path, to);
            redirect_for(request.method(), to)
        }
    }
}

fn redirect_for(method: &Method, to: &str) -> Response {
    if *method == Method::GET || *method == Method::HEAD {
        Redirect::temporary(to).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_classes() {
        assert_eq!(classify("/"), PathClass::Auth);
        assert_eq!(classify("/signin"), PathClass::Auth);
        assert_eq!(classify("/reset-password/abc"), PathClass::Auth);
        assert_eq!(classify("/dashboard"), PathClass::Protected);
        assert_eq!(classify("/users/12"), PathClass::Protected);
        assert_eq!(classify("/black-lists"), PathClass::Admin);
        assert_eq!(classify("/black-lists/3/delete"), PathClass::Admin);
        assert_eq!(classify("/usersettings"), PathClass::Other);
        assert_eq!(classify("/about"), PathClass::Other);
    }

    #[test]
    fn signed_in_users_skip_auth_pages() {
        assert_eq!(evaluate("/", Some("t"), None), GuardDecision::Redirect(DASHBOARD));
        assert_eq!(evaluate("/signin", Some("t"), Some("user")), GuardDecision::Redirect(DASHBOARD));
        assert_eq!(evaluate("/signin", None, None), GuardDecision::Pass);
    }

    #[test]
    fn protected_pages_need_a_token() {
        assert_eq!(evaluate("/dashboard", None, None), GuardDecision::Redirect(HOME));
        assert_eq!(evaluate("/dashboard", Some(""), None), GuardDecision::Redirect(HOME));
        assert_eq!(evaluate("/users", Some("t"), Some("user")), GuardDecision::Pass);
        // role alone is not a session
        assert_eq!(evaluate("/black-lists", None, Some("admin")), GuardDecision::Redirect(HOME));
    }

    #[test]
    fn blacklist_is_admin_only() {
        assert_eq!(
            evaluate("/black-lists", Some("t"), Some("user")),
            GuardDecision::Redirect(DASHBOARD)
        );
        assert_eq!(
            evaluate("/black-lists", Some("t"), None),
            GuardDecision::Redirect(DASHBOARD)
        );
        assert_eq!(evaluate("/black-lists", Some("t"), Some("admin")), GuardDecision::Pass);
        assert_eq!(evaluate("/black-lists", Some("t"), Some("Admin")), GuardDecision::Redirect(DASHBOARD));
    }

    #[test]
    fn other_paths_pass() {
        assert_eq!(evaluate("/about", None, None), GuardDecision::Pass);
        assert_eq!(evaluate("/about", Some("t"), Some("admin")), GuardDecision::Pass);
    }

    #[test]
    fn posts_are_redirected_with_see_other() {
        let response = redirect_for(&Method::POST, DASHBOARD);
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);

        let response = redirect_for(&Method::GET, HOME);
        assert_eq!(response.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
    }
}
