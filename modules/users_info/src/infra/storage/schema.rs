use sqlx::AnyPool;
use tracing::info;

use super::StorageError;

/// Portable DDL: accepted as-is by PostgreSQL and SQLite.
const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id           VARCHAR(36) PRIMARY KEY,
    first_name   VARCHAR(255),
    last_name    VARCHAR(255),
    email        VARCHAR(255),
    phone_number VARCHAR(64),
    created_at   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

/// Create the `users` table when it does not exist yet. Safe to call repeatedly.
pub async fn ensure_schema(pool: &AnyPool) -> Result<(), StorageError> {
    sqlx::query(CREATE_USERS).execute(pool).await?;
    info!("users table is ready");
    Ok(())
}
