use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User row. `password_hash` is nullable: social-only accounts have no
/// local credential and can never pass password login.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub has_used_free_plan: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public user shape returned by the API. Never contains the hash.
#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 8))]
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    /// Client-computed browser fingerprint, used by the risk scorer when
    /// registration gating is enabled.
    pub fingerprint: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub fingerprint: Option<String>,
    pub fingerprint_signals: Option<FingerprintSignals>,
}

/// Weak client-observable signals accompanying a fingerprint. All optional;
/// stored for operator review, never scored directly.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FingerprintSignals {
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 120))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FreePlanEligibilityResponse {
    pub eligible: bool,
}

/// Reject passwords zxcvbn rates below 2 ("somewhat guessable").
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let estimate = zxcvbn::zxcvbn(password, &[]);
    if (estimate.score() as u8) < 2 {
        return Err(ValidationError::new("password_too_weak"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_omits_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            name: Some("Ana".to_string()),
            password_hash: Some("$argon2id$...".to_string()),
            has_used_free_plan: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = UserResponse::from(&user);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json.get("email").unwrap(), "ana@example.com");
    }

    #[test]
    fn weak_passwords_are_rejected() {
        assert!(validate_password_strength("password").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("tr4verse-pylon-weather").is_ok());
    }

    #[test]
    fn register_request_requires_valid_email() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            name: None,
            password: "tr4verse-pylon-weather".to_string(),
            fingerprint: None,
        };
        assert!(request.validate().is_err());
    }
}
