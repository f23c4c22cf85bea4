// === PUBLIC CONTRACT ===
// Only the contract module should be public for other modules to consume
pub mod contract;

// Re-export the public contract components
pub use contract::model;

// === MODULE DEFINITION ===
pub mod module;
pub use config::UsersInfoConfig;
pub use module::UsersInfo;

// === INTERNAL MODULES ===
// Exposed for integration tests; use `contract` and `UsersInfo` from outside the crate.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
