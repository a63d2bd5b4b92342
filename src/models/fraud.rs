use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use sqlx::FromRow;
use uuid::Uuid;

/// Denylist entry kind. Matching is exact on the stored value; for
/// `EmailDomain` the candidate is the part after `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[sqlx(type_name = "fraud_block_type")]
pub enum BlockType {
    #[sqlx(rename = "IP")]
    #[serde(rename = "IP")]
    Ip,
    #[sqlx(rename = "FINGERPRINT")]
    #[serde(rename = "FINGERPRINT")]
    Fingerprint,
    #[sqlx(rename = "EMAIL_DOMAIN")]
    #[serde(rename = "EMAIL_DOMAIN")]
    EmailDomain,
}

/// Operator-maintained denylist row. A hit denies unconditionally before
/// any scoring runs.
#[derive(Debug, Clone, FromRow)]
pub struct FraudBlock {
    pub id: Uuid,
    pub block_type: BlockType,
    pub value: String,
    pub reason: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Global fingerprint row, content-addressed by the fingerprint hash.
/// Deliberately not scoped to a user: the same physical device touching
/// many accounts is exactly the signal the scorer counts.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceFingerprint {
    pub id: Uuid,
    pub fingerprint: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub platform: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a risk assessment. Advisory and recomputed per attempt,
/// never persisted as an account-level score.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FraudCheckResult {
    pub allowed: bool,
    pub risk_score: u8,
    pub reason: Option<String>,
}

impl FraudCheckResult {
    pub fn allow(risk_score: u8) -> Self {
        Self {
            allowed: true,
            risk_score,
            reason: None,
        }
    }

    pub fn deny(risk_score: u8, reason: String) -> Self {
        Self {
            allowed: false,
            risk_score,
            reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(BlockType::Ip).unwrap(), "IP");
        assert_eq!(serde_json::to_value(BlockType::EmailDomain).unwrap(), "EMAIL_DOMAIN");
    }

    #[test]
    fn deny_carries_reason() {
        let result = FraudCheckResult::deny(100, "Blocked: stolen card ring".to_string());
        assert!(!result.allowed);
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.reason.as_deref(), Some("Blocked: stolen card ring"));
    }
}
