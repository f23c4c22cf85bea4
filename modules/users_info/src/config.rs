use serde::{Deserialize, Serialize};

use crate::infra::storage::ListDefaults;

/// Configuration for the users_info module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    #[serde(default = "default_offset")]
    pub default_offset: i64,
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    /// Create the `users` table on startup when it is missing.
    #[serde(default)]
    pub bootstrap_schema: bool,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            default_offset: default_offset(),
            default_limit: default_limit(),
            bootstrap_schema: false,
        }
    }
}

impl UsersInfoConfig {
    pub fn list_defaults(&self) -> ListDefaults {
        ListDefaults {
            offset: self.default_offset,
            limit: self.default_limit,
        }
    }
}

fn default_offset() -> i64 {
    0
}

fn default_limit() -> i64 {
    10
}
