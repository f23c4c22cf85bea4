use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use utoipa::OpenApi;

use crate::api::rest::handlers;
use crate::config::UsersInfoConfig;
use crate::domain::repo::UsersRepository;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "1.0",
        description = "CRUD over the user resource"
    ),
    paths(
        handlers::create_user,
        handlers::get_user,
        handlers::get_user_list,
        handlers::update_user,
        handlers::delete_user
    ),
    tags((name = "User", description = "User management"))
)]
pub struct UsersApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    UsersApiDoc::openapi()
}

/// Mount the five `/user` routes onto `router`.
pub fn register_routes(
    router: Router,
    repo: Arc<dyn UsersRepository>,
    config: Arc<UsersInfoConfig>,
) -> Router {
    let users = Router::new()
        .route(
            "/user",
            post(handlers::create_user).get(handlers::get_user_list),
        )
        .route(
            "/user/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(Extension(repo))
        .layer(Extension(config));

    router.merge(users)
}
