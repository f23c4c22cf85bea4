//! SQL storage for the `users` table, shared by PostgreSQL and SQLite through `sqlx::Any`.

mod error;
pub mod query;
pub mod schema;
pub mod sqlx_repo;

pub use error::StorageError;
pub use schema::ensure_schema;
pub use sqlx_repo::{ListDefaults, SqlxUsersRepository};
