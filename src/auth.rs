use crate::config::SESSION_COOKIE;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use rocket::http::{Cookie, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// The fully authenticated caller. Present only when BOTH checks hold:
/// the private cookie decrypted and verified (the cookie layer's own
/// authenticity check, with its own key lifecycle), AND the token inside
/// it matched an active, unexpired session row. The two have independent
/// lifecycles (a rotated cookie key or a revoked row each kill access on
/// their own), so neither check may be collapsed into the other.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    /// Session that authenticated this request; lets the session UI mark
    /// "this device" and refuse self-revocation.
    pub session_id: Uuid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let cookies = req.cookies();
        let Some(cookie) = cookies.get_private(SESSION_COOKIE) else {
            return Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials));
        };
        let session_token = cookie.value().to_string();

        let pool = match req.rocket().state::<PgPool>() {
            Some(pool) => pool,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };
        let repo = PostgresRepository { pool: pool.clone() };

        // Store failures fall through to the error arm: a request we
        // cannot check is a request we do not admit.
        let session = match repo.validate_session(&session_token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                // Cookie integrity held but the row is gone, revoked or
                // expired: clear the stale cookie so the client stops
                // presenting it.
                cookies.remove_private(Cookie::build(SESSION_COOKIE).build());
                return Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials));
            }
            Err(err) => return Outcome::Error((Status::InternalServerError, err)),
        };

        let user = match repo.get_user_by_id(&session.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                cookies.remove_private(Cookie::build(SESSION_COOKIE).build());
                return Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials));
            }
            Err(err) => return Outcome::Error((Status::InternalServerError, err)),
        };

        let current_user = CurrentUser {
            id: user.id,
            email: user.email,
            session_id: session.id,
        };
        req.local_cache(|| Some(current_user.clone()));
        Outcome::Success(current_user)
    }
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        // Document the cookie-based authentication requirement
        let security_scheme = SecurityScheme {
            description: Some("Cookie-based authentication. Log in via POST /api/v1/auth/login to obtain the session cookie.".to_string()),
            data: SecuritySchemeData::ApiKey {
                name: SESSION_COOKIE.to_string(),
                location: "cookie".to_string(),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - Authentication required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
