use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;

#[derive(Debug, Clone, Copy)]
pub struct CleanupSessionsResult {
    pub sessions_swept: u64,
}

/// One-shot sweep used by the cron binary: open a pool, mark active
/// sessions whose expiry passed as revoked, close the pool. Validation
/// already rejects them either way; this keeps the table honest.
pub async fn cleanup_sessions(config: &Config) -> Result<CleanupSessionsResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let sessions_swept = repo
        .cleanup_expired_sessions()
        .await
        .map_err(|err| format!("Failed to sweep expired sessions: {err:?}"))?;

    pool.close().await;

    Ok(CleanupSessionsResult { sessions_swept })
}
