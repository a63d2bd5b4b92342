use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::audit::audit_events;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{State, post, routes};
use sqlx::PgPool;

pub(crate) struct CronAuth;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CronAuth {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };

        if config.cron.auth_token.is_empty() {
            return Outcome::Error((Status::BadRequest, AppError::BadRequest("Cron auth token is not configured".to_string())));
        }

        let incoming = req.headers().get_one("x-cron-token");
        match incoming {
            Some(token) if token == config.cron.auth_token => Outcome::Success(CronAuth),
            _ => Outcome::Error((Status::Forbidden, AppError::Forbidden)),
        }
    }
}

#[derive(Serialize)]
pub struct CleanupSessionsResponse {
    pub sessions_swept: u64,
}

/// Sweep sessions whose expiry has passed but still carry the active
/// flag. On-demand by design; validation never admits them either way.
#[post("/cleanup-sessions")]
pub async fn cleanup_sessions(pool: &State<PgPool>, _cron_auth: CronAuth) -> Result<Json<CleanupSessionsResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let sessions_swept = repo.cleanup_expired_sessions().await?;

    let _ = repo
        .create_security_audit_log(
            None,
            audit_events::SESSIONS_EXPIRED_SWEPT,
            true,
            None,
            None,
            Some(serde_json::json!({"sessions_swept": sessions_swept})),
        )
        .await;

    Ok(Json(CleanupSessionsResponse { sessions_swept }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![cleanup_sessions]
}
