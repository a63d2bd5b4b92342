use chrono::{DateTime, Utc};
use rocket::serde::Serialize;
use schemars::JsonSchema;
use sqlx::FromRow;
use uuid::Uuid;

/// Validated session as seen by callers of `validate_session`.
#[derive(Debug, Clone, FromRow)]
pub struct SessionData {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// What `create_session` hands back to the login flow. The token leaves the
/// process only inside the session cookie.
#[derive(Debug)]
pub struct CreatedSession {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub device_record_id: Uuid,
}

/// Active-session row for the session-management UI, joined with its device.
#[derive(Debug, FromRow)]
pub struct ActiveSessionRow {
    pub id: Uuid,
    pub device_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub platform: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionInfo {
    pub id: Uuid,
    pub device_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub platform: String,
    /// True for the session that authenticated this request.
    pub is_current: bool,
}

impl SessionInfo {
    pub fn from_row(row: ActiveSessionRow, current_session_id: &Uuid) -> Self {
        Self {
            is_current: row.id == *current_session_id,
            id: row.id,
            device_id: row.device_id,
            expires_at: row.expires_at,
            last_activity: row.last_activity,
            created_at: row.created_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            platform: row.platform,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionInfo>,
}

/// Per-user session counters for the account security page.
#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct SessionStats {
    pub total: i64,
    pub active: i64,
    pub expired: i64,
    pub devices: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionStatusResponse {
    pub valid: bool,
    pub user_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RevokedResponse {
    pub revoked: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_info_marks_current_session() {
        let current = Uuid::new_v4();
        let row = ActiveSessionRow {
            id: current,
            device_id: Uuid::new_v4(),
            expires_at: Utc::now(),
            last_activity: Utc::now(),
            created_at: Utc::now(),
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: None,
            platform: "WEB".to_string(),
        };
        assert!(SessionInfo::from_row(row, &current).is_current);
    }

    #[test]
    fn session_info_marks_other_sessions() {
        let row = ActiveSessionRow {
            id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            expires_at: Utc::now(),
            last_activity: Utc::now(),
            created_at: Utc::now(),
            ip_address: None,
            user_agent: None,
            platform: "DESKTOP_LINUX".to_string(),
        };
        assert!(!SessionInfo::from_row(row, &Uuid::new_v4()).is_current);
    }
}
