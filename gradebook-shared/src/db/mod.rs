/// Database plumbing
///
/// - `pool`: PostgreSQL connection pool construction and health check
/// - `migrations`: sqlx migration runner and dev-time database bootstrap

pub mod migrations;
pub mod pool;
