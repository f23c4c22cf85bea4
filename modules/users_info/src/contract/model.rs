/// Pure user model for inter-module communication (no serde/utoipa).
///
/// Timestamps are whatever text the store renders for them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new user; the id is generated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Partial update for one user. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserUpdate {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrimaryKey {
    pub id: String,
}

impl From<&str> for UserPrimaryKey {
    fn from(id: &str) -> Self {
        Self { id: id.to_owned() }
    }
}

/// Page request. Non-positive values fall back to the storage defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserListQuery {
    pub offset: i64,
    pub limit: i64,
}

/// One page of users plus the total number of rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserList {
    pub count: i64,
    pub users: Vec<User>,
}
