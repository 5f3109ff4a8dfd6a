//! Database connection pool and migration management.

use sqlx::{Pool, Postgres};

/// PostgreSQL connection pool shared by the key store.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// Connections are opened lazily up to `max_connections` and reused across
/// requests.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run the SQL migrations embedded from `migrations/`.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each file runs once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
