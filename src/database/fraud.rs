use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::fraud::{DeviceFingerprint, FraudBlock};
use crate::models::user::FingerprintSignals;
use uuid::Uuid;

impl PostgresRepository {
    /// Find an active, unexpired denylist entry matching the IP, the
    /// fingerprint, or the email domain. Any hit is an unconditional deny
    /// upstream; scoring never runs.
    pub async fn find_active_fraud_block(&self, ip: &str, fingerprint: &str, email_domain: &str) -> Result<Option<FraudBlock>, AppError> {
        let block = sqlx::query_as::<_, FraudBlock>(
            r#"
            SELECT id, block_type, value, reason, is_active, expires_at, created_at
            FROM fraud_blocks
            WHERE is_active = true
              AND (expires_at IS NULL OR expires_at > now())
              AND (
                  (block_type = 'IP' AND value = $1) OR
                  (block_type = 'FINGERPRINT' AND value = $2) OR
                  (block_type = 'EMAIL_DOMAIN' AND value = $3)
              )
            LIMIT 1
            "#,
        )
        .bind(ip)
        .bind(fingerprint)
        .bind(email_domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(block)
    }

    /// Count distinct accounts that have ever been seen with this
    /// fingerprint or this IP. All-time, no decay.
    pub async fn count_fingerprint_reuse(&self, fingerprint: &str, ip: &str) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT uf.user_id)
            FROM user_fingerprints uf
            JOIN device_fingerprints df ON uf.fingerprint_id = df.id
            WHERE df.fingerprint = $1 OR df.ip_address = $2
            "#,
        )
        .bind(fingerprint)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Count distinct users who registered a device from this IP inside
    /// the window and have not yet consumed the free plan.
    pub async fn count_recent_free_plan_signups(&self, ip: &str, window_hours: i64) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT u.id)
            FROM users u
            JOIN devices d ON d.user_id = u.id
            WHERE d.ip = $1
              AND u.has_used_free_plan = false
              AND u.created_at > now() - make_interval(hours => $2)
            "#,
        )
        .bind(ip)
        .bind(window_hours as i32)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Upsert the global fingerprint row. The weak client signals only
    /// ever land on first sight; later sightings refresh the IP and the
    /// timestamp.
    pub async fn upsert_device_fingerprint(
        &self,
        fingerprint: &str,
        ip: &str,
        user_agent: &str,
        signals: Option<&FingerprintSignals>,
    ) -> Result<DeviceFingerprint, AppError> {
        let row = sqlx::query_as::<_, DeviceFingerprint>(
            r#"
            INSERT INTO device_fingerprints
                (fingerprint, ip_address, user_agent, screen_resolution, timezone, locale, platform)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (fingerprint)
            DO UPDATE SET
                updated_at = now(),
                ip_address = EXCLUDED.ip_address
            RETURNING id, fingerprint, ip_address, user_agent, screen_resolution, timezone, locale, platform, created_at, updated_at
            "#,
        )
        .bind(fingerprint)
        .bind(ip)
        .bind(user_agent)
        .bind(signals.and_then(|s| s.screen_resolution.as_deref()))
        .bind(signals.and_then(|s| s.timezone.as_deref()))
        .bind(signals.and_then(|s| s.locale.as_deref()))
        .bind(signals.and_then(|s| s.platform.as_deref()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Record a (user, fingerprint) sighting, bumping the usage counter on
    /// repeats.
    pub async fn touch_user_fingerprint(&self, user_id: &Uuid, fingerprint_id: &Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_fingerprints (user_id, fingerprint_id, last_used_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id, fingerprint_id)
            DO UPDATE SET
                last_used_at = now(),
                usage_count = user_fingerprints.usage_count + 1
            "#,
        )
        .bind(user_id)
        .bind(fingerprint_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    #[ignore = "requires database"]
    async fn blocklist_match_is_found_before_expiry() {
        // Requires a running PostgreSQL at DATABASE_URL.
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reuse_count_is_distinct_per_account() {
        // The same user touching a fingerprint twice must count once.
        // Requires a running PostgreSQL at DATABASE_URL.
    }
}
