pub mod model;

pub use model::{NewUser, User, UserList, UserListQuery, UserPrimaryKey, UserUpdate};
