use crate::Config;
use crate::config::SESSION_COOKIE;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::AuthRateLimit;
use crate::middleware::{ClientIp, UserAgent};
use crate::models::audit::audit_events;
use crate::models::session::SessionStatusResponse;
use crate::models::user::{LoginRequest, LoginResponse, UserResponse};
use crate::service::auth::{AuthService, DeviceInfo};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::serde::json::Json;
use rocket::time::OffsetDateTime;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

fn session_cookie(token: String, expires_at: chrono::DateTime<chrono::Utc>, secure: bool) -> Cookie<'static> {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok();

    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/");
    if let Some(expires) = expires {
        builder = builder.expires(expires);
    }
    builder.build()
}

/// Log in with email and password
///
/// Runs the fraud gate when the client sent a fingerprint, verifies
/// credentials, and issues the session cookie. Bad email and bad password
/// are indistinguishable in the response.
#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(
    pool: &State<PgPool>,
    config: &State<Config>,
    _rate_limit: AuthRateLimit,
    user_agent: UserAgent,
    client_ip: ClientIp,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, config);

    let device = DeviceInfo {
        user_agent: user_agent.0.as_deref().unwrap_or(""),
        ip: client_ip.0.as_deref().unwrap_or("unknown"),
    };

    let success = service
        .login(
            &payload.email,
            &payload.password,
            payload.fingerprint.as_deref(),
            payload.fingerprint_signals.as_ref(),
            device,
        )
        .await?;

    cookies.add_private(session_cookie(
        success.session.session_token.clone(),
        success.session.expires_at,
        config.session.cookie_secure,
    ));

    Ok(Json(LoginResponse {
        user: UserResponse::from(&success.user),
    }))
}

/// Log out the current session
///
/// Revokes the server-side session and removes the cookie. Idempotent:
/// a missing or already-dead session still answers 200.
#[openapi(tag = "Auth")]
#[post("/logout")]
pub async fn logout(pool: &State<PgPool>, _rate_limit: AuthRateLimit, cookies: &CookieJar<'_>) -> Result<Status, AppError> {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        let repo = PostgresRepository { pool: pool.inner().clone() };
        if let Some(session) = repo.validate_session(cookie.value()).await? {
            repo.revoke_session(&session.id, Some(&session.user_id), Some("Manual logout")).await?;
            let _ = repo
                .create_security_audit_log(Some(&session.user_id), audit_events::LOGOUT, true, None, None, None)
                .await;
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE).build());
    Ok(Status::Ok)
}

/// Current session validity
///
/// Client-side polling endpoint; public on purpose so a signed-out client
/// gets a clean `valid: false` instead of a 401.
#[openapi(tag = "Auth")]
#[get("/session")]
pub async fn session_status(pool: &State<PgPool>, cookies: &CookieJar<'_>) -> Result<Json<SessionStatusResponse>, AppError> {
    let Some(cookie) = cookies.get_private(SESSION_COOKIE) else {
        return Ok(Json(SessionStatusResponse {
            valid: false,
            user_id: None,
            expires_at: None,
        }));
    };

    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.validate_session(cookie.value()).await? {
        Some(session) => Ok(Json(SessionStatusResponse {
            valid: true,
            user_id: Some(session.user_id),
            expires_at: Some(session.expires_at),
        })),
        None => {
            cookies.remove_private(Cookie::build(SESSION_COOKIE).build());
            Ok(Json(SessionStatusResponse {
                valid: false,
                user_id: None,
                expires_at: None,
            }))
        }
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![login, logout, session_status]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn session_cookie_carries_required_attributes() {
        let expires_at = Utc::now() + Duration::days(30);
        let cookie = session_cookie("token".to_string(), expires_at, true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        let expires = cookie.expires_datetime().expect("expiry set");
        assert_eq!(expires.unix_timestamp(), expires_at.timestamp());
    }

    #[test]
    fn session_cookie_secure_flag_follows_config() {
        let cookie = session_cookie("token".to_string(), Utc::now(), false);
        assert_ne!(cookie.secure(), Some(true));
    }
}
