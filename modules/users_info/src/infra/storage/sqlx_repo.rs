//! `sqlx::Any` repository for the `users` table.
//!
//! Statements use `$N` placeholders, which both PostgreSQL and SQLite accept.
//! Timestamps are selected as text so the same decoding works on every backend.

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::query::UpdateStatement;
use super::StorageError;
use crate::contract::model::{NewUser, User, UserList, UserListQuery, UserPrimaryKey, UserUpdate};
use crate::domain::repo::UsersRepository;

const SELECT_COLUMNS: &str = "id, first_name, last_name, email, phone_number, \
     CAST(created_at AS TEXT) AS created_at, CAST(updated_at AS TEXT) AS updated_at";

/// Page values used when a list request carries non-positive offset/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDefaults {
    pub offset: i64,
    pub limit: i64,
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

impl ListDefaults {
    /// Effective `(offset, limit)` for a request.
    pub fn resolve(&self, query: UserListQuery) -> (i64, i64) {
        let offset = if query.offset > 0 {
            query.offset
        } else {
            self.offset
        };
        let limit = if query.limit > 0 {
            query.limit
        } else {
            self.limit
        };
        (offset, limit)
    }
}

/// Repository over a shared pool. Cloning shares the pool.
#[derive(Clone)]
pub struct SqlxUsersRepository {
    pool: AnyPool,
    defaults: ListDefaults,
}

impl SqlxUsersRepository {
    pub fn new(pool: AnyPool, defaults: ListDefaults) -> Self {
        Self { pool, defaults }
    }
}

fn text(row: &AnyRow, column: &str) -> Result<String, sqlx::Error> {
    Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
}

fn user_from_row(row: &AnyRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: text(row, "id")?,
        first_name: text(row, "first_name")?,
        last_name: text(row, "last_name")?,
        email: text(row, "email")?,
        phone_number: text(row, "phone_number")?,
        created_at: text(row, "created_at")?,
        updated_at: text(row, "updated_at")?,
    })
}

#[async_trait]
impl UsersRepository for SqlxUsersRepository {
    async fn create(&self, req: NewUser) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, phone_number) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(req.first_name)
        .bind(req.last_name)
        .bind(req.email)
        .bind(req.phone_number)
        .execute(&self.pool)
        .await?;
        debug!(%id, "user inserted");
        Ok(id)
    }

    async fn get_by_id(&self, key: UserPrimaryKey) -> Result<User, StorageError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(key.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user_from_row(&row)?)
    }

    async fn get_list(&self, query: UserListQuery) -> Result<UserList, StorageError> {
        let (offset, limit) = self.defaults.resolve(query);
        let sql = format!(
            "SELECT COUNT(*) OVER() AS total, {SELECT_COLUMNS} FROM users \
             ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut list = UserList::default();
        for row in &rows {
            list.count = row.try_get::<i64, _>("total")?;
            list.users.push(user_from_row(row)?);
        }
        Ok(list)
    }

    async fn update(&self, req: UserUpdate) -> Result<u64, StorageError> {
        let (sql, values) = UpdateStatement::new("users", "id")
            .touch("updated_at")
            .set_opt("first_name", req.first_name)
            .set_opt("last_name", req.last_name)
            .set_opt("email", req.email)
            .set_opt("phone_number", req.phone_number)
            .into_parts();

        let mut q = sqlx::query(&sql);
        for v in values {
            q = q.bind(v);
        }
        let res = q.bind(req.id).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, key: UserPrimaryKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(key.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_paging_falls_back_to_defaults() {
        let d = ListDefaults {
            offset: 5,
            limit: 20,
        };
        assert_eq!(d.resolve(UserListQuery { offset: 0, limit: 0 }), (5, 20));
        assert_eq!(d.resolve(UserListQuery { offset: -3, limit: -1 }), (5, 20));
        assert_eq!(d.resolve(UserListQuery { offset: 2, limit: 1000 }), (2, 1000));
    }
}
