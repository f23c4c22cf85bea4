use std::sync::Arc;

use axum::Router;
use db::{ConnectOpts, DbHandle};
use users_info::config::UsersInfoConfig;
use users_info::domain::repo::UsersRepository;
use users_info::infra::storage::{ensure_schema, ListDefaults, SqlxUsersRepository};
use users_info::UsersInfo;

/// Fresh in-memory SQLite database with the `users` table.
pub async fn create_test_db() -> DbHandle {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    ensure_schema(db.pool())
        .await
        .expect("Failed to create schema");
    db
}

pub async fn create_test_repo() -> (DbHandle, Arc<dyn UsersRepository>) {
    let db = create_test_db().await;
    let repo = SqlxUsersRepository::new(db.pool().clone(), ListDefaults::default());
    (db, Arc::new(repo))
}

/// Router built through the real module wiring. Keep the handle alive for the test.
pub async fn create_test_router(config: UsersInfoConfig) -> (DbHandle, Router) {
    let db = create_test_db().await;
    let module = UsersInfo::init(&db, config);
    let router = module.register_rest(Router::new());
    (db, router)
}
