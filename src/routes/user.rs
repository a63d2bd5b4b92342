use crate::Config;
use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::{AuthRateLimit, RateLimit};
use crate::middleware::{ClientIp, UserAgent};
use crate::models::audit::audit_events;
use crate::models::user::{ChangePasswordRequest, FreePlanEligibilityResponse, RegisterRequest, UpdateProfileRequest, UserResponse};
use crate::service::auth::{AuthService, DeviceInfo};
use crate::service::email::EmailService;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// Register a new account
///
/// Duplicate emails answer 409 without touching the existing account.
/// The welcome email goes out in the background; its failure never fails
/// the registration.
#[openapi(tag = "Users")]
#[post("/", data = "<payload>")]
pub async fn register(
    pool: &State<PgPool>,
    config: &State<Config>,
    _rate_limit: AuthRateLimit,
    user_agent: UserAgent,
    client_ip: ClientIp,
    payload: JsonBody<RegisterRequest>,
) -> Result<Created<Json<UserResponse>>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, config);

    let device = DeviceInfo {
        user_agent: user_agent.0.as_deref().unwrap_or(""),
        ip: client_ip.0.as_deref().unwrap_or("unknown"),
    };

    let user = service
        .register(&payload.email, payload.name.as_deref(), &payload.password, payload.fingerprint.as_deref(), device)
        .await?;

    let email_service = EmailService::new(config.email.clone());
    let to_email = user.email.clone();
    let to_name = user.name.clone();
    tokio::spawn(async move {
        if let Err(err) = email_service.send_welcome_email(&to_email, to_name.as_deref()).await {
            tracing::warn!("Failed to send welcome email to {}: {:?}", to_email, err);
        }
    });

    let location = format!("/api/v1/users/{}", user.id);
    Ok(Created::new(location).body(Json(UserResponse::from(&user))))
}

/// Current user's profile
#[openapi(tag = "Users")]
#[get("/me")]
pub async fn get_me(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&current_user.id).await?.ok_or(AppError::UserNotFound)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Update name and email
#[openapi(tag = "Users")]
#[put("/me", data = "<payload>")]
pub async fn update_me(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let user = repo.update_profile(&current_user.id, &email, name).await?;

    let _ = repo
        .create_security_audit_log(Some(&current_user.id), audit_events::ACCOUNT_UPDATED, true, None, None, None)
        .await;

    Ok(Json(UserResponse::from(&user)))
}

/// Change password
///
/// Verifies the current password first, then revokes every other session:
/// a credential change invalidates whatever else is holding one.
#[openapi(tag = "Users")]
#[post("/change-password", data = "<payload>")]
pub async fn change_password(
    pool: &State<PgPool>,
    _rate_limit: AuthRateLimit,
    current_user: CurrentUser,
    payload: Json<ChangePasswordRequest>,
) -> Result<Status, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    repo.change_password(&current_user.id, &payload.current_password, &payload.new_password).await?;

    let revoked = repo.revoke_all_user_sessions(&current_user.id, Some(&current_user.session_id)).await?;

    let _ = repo
        .create_security_audit_log(
            Some(&current_user.id),
            audit_events::PASSWORD_CHANGED,
            true,
            None,
            None,
            Some(serde_json::json!({"other_sessions_revoked": revoked})),
        )
        .await;

    Ok(Status::Ok)
}

/// Whether the caller can still activate the free plan
#[openapi(tag = "Users")]
#[get("/free-plan-eligibility")]
pub async fn free_plan_eligibility(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
) -> Result<Json<FreePlanEligibilityResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&current_user.id).await?.ok_or(AppError::UserNotFound)?;

    Ok(Json(FreePlanEligibilityResponse {
        eligible: !user.has_used_free_plan,
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, get_me, update_me, change_password, free_plan_eligibility]
}
