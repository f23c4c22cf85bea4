//! Process-level plumbing shared by the server binary: layered configuration
//! and logging initialisation.

pub mod config;
pub mod logging;
mod paths;

pub use config::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig};
