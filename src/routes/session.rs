use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::audit::audit_events;
use crate::models::session::{RevokedResponse, SessionInfo, SessionListResponse, SessionStats};
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// List the caller's active sessions
///
/// Each entry is annotated with whether it is the session serving this
/// request, so the UI can label "this device" and disable its revoke
/// button.
#[openapi(tag = "Sessions")]
#[get("/")]
pub async fn list_sessions(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<SessionListResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let rows = repo.list_active_sessions(&current_user.id).await?;

    let sessions = rows.into_iter().map(|row| SessionInfo::from_row(row, &current_user.session_id)).collect();

    Ok(Json(SessionListResponse { sessions }))
}

/// Revoke one session by id
///
/// The caller's own current session is refused; that path is logout,
/// which also clears the cookie.
#[openapi(tag = "Sessions")]
#[delete("/<id>")]
pub async fn revoke_session(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<rocket::http::Status, AppError> {
    let session_id = Uuid::parse_str(id)?;

    if session_id == current_user.session_id {
        return Err(AppError::BadRequest("Cannot revoke the current session; use logout instead".to_string()));
    }

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let revoked = repo.revoke_owned_session(&session_id, &current_user.id, "Manual revocation").await?;
    if !revoked {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    let _ = repo
        .create_security_audit_log(
            Some(&current_user.id),
            audit_events::SESSION_REVOKED,
            true,
            None,
            None,
            Some(serde_json::json!({"session_id": session_id})),
        )
        .await;

    Ok(rocket::http::Status::Ok)
}

/// Log out all other devices
///
/// Revokes every active session except the one serving this request.
/// Takes effect on the victims' very next request.
#[openapi(tag = "Sessions")]
#[post("/revoke-others")]
pub async fn revoke_other_sessions(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<RevokedResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let revoked = repo.revoke_all_user_sessions(&current_user.id, Some(&current_user.session_id)).await?;

    let _ = repo
        .create_security_audit_log(
            Some(&current_user.id),
            audit_events::SESSIONS_REVOKED_ALL,
            true,
            None,
            None,
            Some(serde_json::json!({"revoked": revoked})),
        )
        .await;

    Ok(Json(RevokedResponse { revoked }))
}

/// Session counters for the account security page
#[openapi(tag = "Sessions")]
#[get("/stats")]
pub async fn session_stats(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<SessionStats>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let stats = repo.get_session_stats(&current_user.id).await?;
    Ok(Json(stats))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_sessions, revoke_session, revoke_other_sessions, session_stats]
}
