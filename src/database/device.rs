use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::device::{Device, Platform};
use crate::service::device::{device_id, platform_from_user_agent};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Upsert the (user, device-signature) row, returning its id. Keyed on
/// (user_id, device_hash): a repeat sighting touches last_seen_at and
/// refreshes the captured user agent and IP instead of inserting.
///
/// Takes any executor so `create_session` can run it inside the same
/// transaction as the session insert (device row first, session row
/// second, since the FK points that way).
pub(crate) async fn upsert_device<'e, E>(
    executor: E,
    user_id: &Uuid,
    device_hash: &str,
    platform: Platform,
    user_agent: &str,
    ip: &str,
) -> Result<Uuid, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO devices (user_id, device_hash, platform, user_agent, ip, last_seen_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (user_id, device_hash)
        DO UPDATE SET
            last_seen_at = now(),
            user_agent = EXCLUDED.user_agent,
            ip = EXCLUDED.ip
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(device_hash)
    .bind(platform)
    .bind(user_agent)
    .bind(ip)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

impl PostgresRepository {
    /// Register the current device or touch its last-seen timestamp.
    /// Idempotent; safe to call on every request.
    pub async fn register_or_touch_device(&self, user_id: &Uuid, user_agent: &str, ip: &str) -> Result<Uuid, AppError> {
        let hash = device_id(user_agent, ip);
        let platform = platform_from_user_agent(user_agent);

        let id = upsert_device(&self.pool, user_id, &hash, platform, user_agent, ip).await?;
        Ok(id)
    }

    pub async fn list_devices(&self, user_id: &Uuid) -> Result<Vec<Device>, AppError> {
        let devices = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_hash, platform, user_agent, ip, last_seen_at, created_at
            FROM devices
            WHERE user_id = $1
            ORDER BY last_seen_at DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }

    /// Logical disconnect of one device record. Does not touch sessions;
    /// session revocation is a separate, explicit action.
    pub async fn delete_device(&self, user_id: &Uuid, device_record_id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1 AND user_id = $2")
            .bind(device_record_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    #[ignore = "requires database"]
    async fn register_twice_keeps_one_row_per_signature() {
        // Same user agent + IP registered twice must leave exactly one
        // devices row for the user, with a refreshed last_seen_at.
        // Requires a running PostgreSQL at DATABASE_URL.
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_foreign_device_returns_false() {
        // Requires a running PostgreSQL at DATABASE_URL.
    }
}
