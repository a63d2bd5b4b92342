use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::middleware::{ClientIp, UserAgent};
use crate::models::audit::audit_events;
use crate::models::device::{DeviceResponse, RegisterDeviceResponse};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// Register or touch the current device
///
/// Called on page load. Idempotent: the same user agent and IP always
/// lands on the same row, only refreshing its last-seen timestamp.
#[openapi(tag = "Devices")]
#[post("/current")]
pub async fn register_current_device(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    user_agent: UserAgent,
    client_ip: ClientIp,
) -> Result<Json<RegisterDeviceResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    let device_id = repo
        .register_or_touch_device(
            &current_user.id,
            user_agent.0.as_deref().unwrap_or(""),
            client_ip.0.as_deref().unwrap_or("unknown"),
        )
        .await?;

    Ok(Json(RegisterDeviceResponse { device_id }))
}

/// List the caller's devices, most recently seen first
#[openapi(tag = "Devices")]
#[get("/")]
pub async fn list_devices(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let devices = repo.list_devices(&current_user.id).await?;
    Ok(Json(devices.iter().map(DeviceResponse::from).collect()))
}

/// Disconnect one device record
///
/// A logical disconnect only: sessions bound to the device stay subject
/// to their own revocation flow.
#[openapi(tag = "Devices")]
#[delete("/<id>")]
pub async fn delete_device(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Status, AppError> {
    let device_id = Uuid::parse_str(id)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let deleted = repo.delete_device(&current_user.id, &device_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Device not found".to_string()));
    }

    let _ = repo
        .create_security_audit_log(
            Some(&current_user.id),
            audit_events::DEVICE_REMOVED,
            true,
            None,
            None,
            Some(serde_json::json!({"device_id": device_id})),
        )
        .await;

    Ok(Status::Ok)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register_current_device, list_devices, delete_device]
}
