use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::rest::dto::{CreateUserReq, ListUsersQuery, UpdateUserReq, UserDto, UserListDto};
use crate::api::rest::response::{respond, Envelope};
use crate::config::UsersInfoConfig;
use crate::contract::model::{UserListQuery, UserPrimaryKey};
use crate::domain::repo::UsersRepository;

type Repo = Extension<Arc<dyn UsersRepository>>;

fn is_valid_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Empty or absent means "use the configured default".
fn page_param(raw: Option<&str>, default: i64) -> Result<i64, std::num::ParseIntError> {
    match raw {
        None | Some("") => Ok(default),
        Some(v) => v.parse(),
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/user",
    tag = "User",
    operation_id = "create_user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = Envelope<UserDto>),
        (status = 400, description = "Bad request", body = Envelope<String>),
        (status = 500, description = "Server error", body = Envelope<String>)
    )
)]
pub async fn create_user(
    Extension(repo): Repo,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return respond("create user: bad body", StatusCode::BAD_REQUEST, e.body_text()),
    };

    let id = match repo.create(req.into()).await {
        Ok(id) => id,
        Err(e) => {
            return respond(
                "create user: storage create",
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            )
        }
    };

    match repo.get_by_id(UserPrimaryKey { id }).await {
        Ok(user) => respond("create user", StatusCode::CREATED, UserDto::from(user)),
        Err(e) => respond(
            "create user: storage get_by_id",
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        ),
    }
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "User",
    operation_id = "get_user_by_id",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "User", body = Envelope<UserDto>),
        (status = 400, description = "Bad request", body = Envelope<String>),
        (status = 500, description = "Server error", body = Envelope<String>)
    )
)]
pub async fn get_user(Extension(repo): Repo, Path(id): Path<String>) -> Response {
    if !is_valid_id(&id) {
        return respond("get user: invalid id", StatusCode::BAD_REQUEST, "invalid id");
    }

    match repo.get_by_id(UserPrimaryKey { id }).await {
        Ok(user) => respond("get user", StatusCode::OK, UserDto::from(user)),
        Err(e) => respond(
            "get user: storage get_by_id",
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        ),
    }
}

/// List users page by page
#[utoipa::path(
    get,
    path = "/user",
    tag = "User",
    operation_id = "get_user_list",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = Envelope<UserListDto>),
        (status = 400, description = "Bad request", body = Envelope<String>),
        (status = 500, description = "Server error", body = Envelope<String>)
    )
)]
pub async fn get_user_list(
    Extension(repo): Repo,
    Extension(cfg): Extension<Arc<UsersInfoConfig>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(pairs)) => ListUsersQuery::from_pairs(pairs),
        Err(e) => return respond("list users: bad query", StatusCode::BAD_REQUEST, e.body_text()),
    };
    let Ok(offset) = page_param(query.offset.as_deref(), cfg.default_offset) else {
        return respond("list users: offset", StatusCode::BAD_REQUEST, "invalid offset");
    };
    let Ok(limit) = page_param(query.limit.as_deref(), cfg.default_limit) else {
        return respond("list users: limit", StatusCode::BAD_REQUEST, "invalid limit");
    };

    match repo.get_list(UserListQuery { offset, limit }).await {
        Ok(list) => respond("list users", StatusCode::OK, UserListDto::from(list)),
        Err(e) => respond(
            "list users: storage get_list",
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        ),
    }
}

/// Update a user
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "User",
    operation_id = "update_user",
    params(("id" = String, Path, description = "User id (UUID)")),
    request_body = UpdateUserReq,
    responses(
        (status = 202, description = "Updated user", body = Envelope<UserDto>),
        (status = 400, description = "Bad request", body = Envelope<String>),
        (status = 500, description = "Server error", body = Envelope<String>)
    )
)]
pub async fn update_user(
    Extension(repo): Repo,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Response {
    if !is_valid_id(&id) {
        return respond("update user: invalid id", StatusCode::BAD_REQUEST, "invalid id");
    }
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return respond("update user: bad body", StatusCode::BAD_REQUEST, e.body_text()),
    };

    match repo.update(req.into_update(id.clone())).await {
        Ok(0) => {
            return respond(
                "update user: storage update",
                StatusCode::BAD_REQUEST,
                "no rows affected",
            )
        }
        Ok(_) => {}
        Err(e) => {
            return respond(
                "update user: storage update",
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            )
        }
    }

    match repo.get_by_id(UserPrimaryKey { id }).await {
        Ok(user) => respond("update user", StatusCode::ACCEPTED, UserDto::from(user)),
        Err(e) => respond(
            "update user: storage get_by_id",
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        ),
    }
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "User",
    operation_id = "delete_user",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Bad request", body = Envelope<String>),
        (status = 500, description = "Server error", body = Envelope<String>)
    )
)]
pub async fn delete_user(Extension(repo): Repo, Path(id): Path<String>) -> Response {
    if !is_valid_id(&id) {
        return respond("delete user: invalid id", StatusCode::BAD_REQUEST, "invalid id");
    }

    match repo.delete(UserPrimaryKey { id }).await {
        Ok(()) => respond("delete user", StatusCode::NO_CONTENT, ()),
        Err(e) => respond(
            "delete user: storage delete",
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_param_defaults_and_parsing() {
        assert_eq!(page_param(None, 10).unwrap(), 10);
        assert_eq!(page_param(Some(""), 10).unwrap(), 10);
        assert_eq!(page_param(Some("3"), 10).unwrap(), 3);
        assert_eq!(page_param(Some("-1"), 10).unwrap(), -1);
        assert!(page_param(Some("abc"), 10).is_err());
        assert!(page_param(Some("1.5"), 10).is_err());
    }

    #[test]
    fn repeated_paging_keys_keep_the_first_value() {
        let pairs = [("offset", "1"), ("limit", "4"), ("offset", "2"), ("sort", "x")]
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .to_vec();
        let query = ListUsersQuery::from_pairs(pairs);
        assert_eq!(query.offset.as_deref(), Some("1"));
        assert_eq!(query.limit.as_deref(), Some("4"));
    }

    #[test]
    fn id_validation() {
        assert!(is_valid_id("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!is_valid_id("not-a-uuid"));
        assert!(!is_valid_id(""));
    }
}
