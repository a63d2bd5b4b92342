use sqlx::PgPool;

/// Storage client handed down from process start. Construct once per
/// request from the managed pool; the clone is cheap (the pool is an Arc).
#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}
