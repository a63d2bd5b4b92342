use crate::middleware::rate_limit::RateLimitRetryAfter;
use rocket::Responder;
use rocket::http::Header;
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Error {
    pub message: String,
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Not found".to_string(),
    })
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Conflict".to_string(),
    })
}

/// 429 body carrying the Retry-After header computed by the rate limiter.
#[derive(Responder)]
#[response(status = 429)]
pub struct TooManyRequestsResponse {
    body: Json<Error>,
    retry_after: Header<'static>,
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> TooManyRequestsResponse {
    let retry_after_secs = req
        .local_cache(|| None::<RateLimitRetryAfter>)
        .as_ref()
        .map(|r| r.0)
        .unwrap_or(60);

    TooManyRequestsResponse {
        body: Json(Error {
            message: "Too many requests".to_string(),
        }),
        retry_after: Header::new("Retry-After", retry_after_secs.to_string()),
    }
}
