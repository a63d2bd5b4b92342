use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use sqlx::FromRow;
use uuid::Uuid;

/// Platform classification parsed from the user agent. Best effort, not a
/// security boundary; anything unrecognized is `Web`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[sqlx(type_name = "device_platform")]
pub enum Platform {
    #[sqlx(rename = "WEB")]
    #[serde(rename = "WEB")]
    Web,
    #[sqlx(rename = "MOBILE_IOS")]
    #[serde(rename = "MOBILE_IOS")]
    MobileIos,
    #[sqlx(rename = "MOBILE_ANDROID")]
    #[serde(rename = "MOBILE_ANDROID")]
    MobileAndroid,
    #[sqlx(rename = "DESKTOP_MAC")]
    #[serde(rename = "DESKTOP_MAC")]
    DesktopMac,
    #[sqlx(rename = "DESKTOP_WINDOWS")]
    #[serde(rename = "DESKTOP_WINDOWS")]
    DesktopWindows,
    #[sqlx(rename = "DESKTOP_LINUX")]
    #[serde(rename = "DESKTOP_LINUX")]
    DesktopLinux,
}

/// One (user, device-signature) pairing. `device_hash` is the derived id
/// from `service::device::device_id`; at most one row per (user_id,
/// device_hash); re-registration touches `last_seen_at` instead of
/// inserting.
#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_hash: String,
    pub platform: Platform,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub device_hash: String,
    pub platform: Platform,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Device> for DeviceResponse {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id,
            device_hash: device.device_hash.clone(),
            platform: device.platform,
            user_agent: device.user_agent.clone(),
            ip: device.ip.clone(),
            last_seen_at: device.last_seen_at,
            created_at: device.created_at,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RegisterDeviceResponse {
    pub device_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(Platform::MobileIos).unwrap(), "MOBILE_IOS");
        assert_eq!(serde_json::to_value(Platform::Web).unwrap(), "WEB");
        assert_eq!(serde_json::to_value(Platform::DesktopWindows).unwrap(), "DESKTOP_WINDOWS");
    }
}
