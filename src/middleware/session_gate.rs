//! Per-request admission decisions for the page router.
//!
//! The page-serving frontend sits in front of this API and asks one
//! question per navigation: given the state of the two token layers, may
//! this request proceed, and if not, where does it go? The answer depends
//! only on the route class and the two validity bits, so the whole policy
//! lives here as a pure function and the router stays a dumb executor.

/// Route classes the gate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Auth endpoints and static assets: always admitted, no checks.
    Public,
    /// Pages only meaningful to signed-out visitors (login, signup,
    /// password recovery).
    AuthOnly,
    /// Everything else.
    Protected,
}

/// Pages only unauthenticated visitors should see.
const AUTH_ROUTES: &[&str] = &["/", "/signup", "/auth/forgot-password", "/auth/reset-password"];

/// API namespaces that must work without a session (they are how you get
/// one), plus static assets.
const PUBLIC_PREFIXES: &[&str] = &["/api/v1/auth/", "/api/v1/password-reset/", "/assets/", "/favicon.ico", "/logo.png"];

/// Endpoints that are public as exact paths (registration lives at the
/// collection root whose sub-paths are protected).
const PUBLIC_EXACT: &[&str] = &["/api/v1/users", "/api/v1/health"];

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        if PUBLIC_EXACT.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            return RouteClass::Public;
        }
        if AUTH_ROUTES.contains(&path) {
            return RouteClass::AuthOnly;
        }
        RouteClass::Protected
    }
}

/// What the router should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Signed-in user on a signed-out page.
    RedirectToDashboard,
    RedirectToLogin {
        /// Original destination, preserved so login can bounce back.
        callback: Option<String>,
        /// Ask the client to drop a stale session cookie on the way out.
        clear_session_cookie: bool,
    },
}

/// The full admission table. `external_valid` is the cookie-layer check
/// (the cookie decrypted and authenticated); `internal_valid` is the
/// server-side session row check. Both must hold for a request to count
/// as authenticated; the layers have independent lifecycles, so neither
/// subsumes the other. Callers that could not evaluate a check (store
/// failure) must pass `false` for it: unknown means unauthenticated.
pub fn decide(class: RouteClass, external_valid: bool, internal_valid: bool, path_and_query: &str) -> GateDecision {
    match class {
        RouteClass::Public => GateDecision::Allow,
        RouteClass::AuthOnly => {
            if external_valid && internal_valid {
                GateDecision::RedirectToDashboard
            } else {
                GateDecision::Allow
            }
        }
        RouteClass::Protected => {
            if external_valid && internal_valid {
                GateDecision::Allow
            } else if external_valid {
                // The outer token survived but the session is gone,
                // revoked or expired. Clear the stale cookie so the
                // client stops presenting it.
                GateDecision::RedirectToLogin {
                    callback: None,
                    clear_session_cookie: true,
                }
            } else {
                GateDecision::RedirectToLogin {
                    callback: Some(path_and_query.to_string()),
                    clear_session_cookie: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_and_assets_are_public() {
        assert_eq!(RouteClass::classify("/api/v1/auth/login"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/api/v1/auth/session"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/api/v1/password-reset/request"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/api/v1/users"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/favicon.ico"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/assets/app.css"), RouteClass::Public);
    }

    #[test]
    fn signed_out_pages_are_auth_only() {
        assert_eq!(RouteClass::classify("/"), RouteClass::AuthOnly);
        assert_eq!(RouteClass::classify("/signup"), RouteClass::AuthOnly);
        assert_eq!(RouteClass::classify("/auth/forgot-password"), RouteClass::AuthOnly);
        assert_eq!(RouteClass::classify("/auth/reset-password"), RouteClass::AuthOnly);
    }

    #[test]
    fn everything_else_is_protected() {
        assert_eq!(RouteClass::classify("/dashboard"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/devices"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/api/v1/users/me"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/api/v1/sessions"), RouteClass::Protected);
    }

    #[test]
    fn fully_authenticated_protected_request_is_allowed() {
        assert_eq!(decide(RouteClass::Protected, true, true, "/dashboard"), GateDecision::Allow);
    }

    #[test]
    fn fully_authenticated_on_login_page_goes_to_dashboard() {
        assert_eq!(decide(RouteClass::AuthOnly, true, true, "/"), GateDecision::RedirectToDashboard);
    }

    #[test]
    fn dead_internal_session_clears_cookie_and_redirects() {
        // Valid external token, missing/revoked session row.
        assert_eq!(
            decide(RouteClass::Protected, true, false, "/dashboard"),
            GateDecision::RedirectToLogin {
                callback: None,
                clear_session_cookie: true,
            }
        );
    }

    #[test]
    fn missing_external_token_preserves_callback() {
        assert_eq!(
            decide(RouteClass::Protected, false, true, "/history?page=2"),
            GateDecision::RedirectToLogin {
                callback: Some("/history?page=2".to_string()),
                clear_session_cookie: false,
            }
        );
    }

    #[test]
    fn signed_out_visitor_may_use_auth_pages() {
        assert_eq!(decide(RouteClass::AuthOnly, false, false, "/"), GateDecision::Allow);
        assert_eq!(decide(RouteClass::AuthOnly, true, false, "/signup"), GateDecision::Allow);
    }

    #[test]
    fn public_routes_bypass_both_checks() {
        assert_eq!(decide(RouteClass::Public, false, false, "/api/v1/auth/login"), GateDecision::Allow);
        assert_eq!(decide(RouteClass::Public, true, true, "/api/v1/auth/login"), GateDecision::Allow);
    }

    #[test]
    fn an_internal_session_alone_is_insufficient() {
        // The AND is symmetric: a live session row without the outer
        // token still redirects.
        assert!(matches!(
            decide(RouteClass::Protected, false, true, "/dashboard"),
            GateDecision::RedirectToLogin { .. }
        ));
    }
}
