use async_trait::async_trait;

use crate::contract::model::{NewUser, User, UserList, UserListQuery, UserPrimaryKey, UserUpdate};
use crate::infra::storage::StorageError;

/// Port for the REST layer: persistence operations on the `users` table.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a new row and return its generated id.
    async fn create(&self, req: NewUser) -> Result<String, StorageError>;
    /// Load one user. A missing row is an error, not `None`.
    async fn get_by_id(&self, key: UserPrimaryKey) -> Result<User, StorageError>;
    /// One page of users with the total row count.
    async fn get_list(&self, query: UserListQuery) -> Result<UserList, StorageError>;
    /// Apply the present fields and refresh `updated_at`. Returns rows affected.
    async fn update(&self, req: UserUpdate) -> Result<u64, StorageError>;
    /// Hard delete. Deleting an absent id is not an error.
    async fn delete(&self, key: UserPrimaryKey) -> Result<(), StorageError>;
}
