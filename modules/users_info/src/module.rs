use std::sync::Arc;

use axum::Router;
use db::DbHandle;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::UsersInfoConfig;
use crate::domain::repo::UsersRepository;
use crate::infra::storage::{ensure_schema, SqlxUsersRepository};

/// The users resource: owns the repository and mounts the `/user` routes.
#[derive(Clone)]
pub struct UsersInfo {
    repo: Arc<dyn UsersRepository>,
    config: Arc<UsersInfoConfig>,
}

impl UsersInfo {
    /// Wire the SQL repository onto the shared pool.
    pub fn init(db: &DbHandle, config: UsersInfoConfig) -> Self {
        info!("Initializing users_info module");
        debug!(
            "Loaded users_info config: default_offset={}, default_limit={}",
            config.default_offset, config.default_limit
        );
        let repo = SqlxUsersRepository::new(db.pool().clone(), config.list_defaults());
        Self::with_repository(Arc::new(repo), config)
    }

    /// Build around any repository implementation.
    pub fn with_repository(repo: Arc<dyn UsersRepository>, config: UsersInfoConfig) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &UsersInfoConfig {
        &self.config
    }

    /// Create the `users` table if it is missing.
    pub async fn migrate(&self, db: &DbHandle) -> anyhow::Result<()> {
        info!("Ensuring users_info schema");
        ensure_schema(db.pool()).await?;
        Ok(())
    }

    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering users_info REST routes");
        routes::register_routes(router, self.repo.clone(), self.config.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        routes::openapi()
    }
}
