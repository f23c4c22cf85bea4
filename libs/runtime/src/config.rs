//! Service configuration, layered as built-in defaults, then the YAML file, then
//! `APP__`-prefixed environment variables (`APP__SERVER__PORT=9000`).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::paths::home_dir::resolve_home_dir;

/// Used when `server.home_dir` is left empty: `$HOME/.users_service`.
pub const DEFAULT_HOME_SUBDIR: &str = ".users_service";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Raw per-module sections, typed on demand by [`AppConfig::module_config`].
    #[serde(default)]
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; relative log and SQLite paths hang off it.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request deadline in seconds, 0 for none.
    pub timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".into(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `postgres://...` or `sqlite://<path>`; relative SQLite paths resolve under `home_dir`.
    pub url: String,
    pub max_conns: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://database/users.db".into(),
            max_conns: 10,
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub console_level: String,
    /// JSON log file; empty disables it. Relative paths resolve under `home_dir`.
    pub file: String,
    pub file_level: String,
    pub max_size_mb: u64,
    /// Rotated files kept; 0 keeps files younger than `max_age_days` instead.
    pub max_backups: usize,
    pub max_age_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: "info".into(),
            file: "logs/users_service.log".into(),
            file_level: "debug".into(),
            max_size_mb: 100,
            max_backups: 3,
            max_age_days: 7,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path`, then the environment. `server.home_dir` is made
    /// absolute and created.
    pub fn load_layered(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .with_context(|| format!("Failed to parse yaml config {}", path.display()))?;

        config.resolve_home_dir()?;
        Ok(config)
    }

    /// Built-in defaults when no file is given.
    pub fn load_or_default(path: Option<impl AsRef<Path>>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_layered(path);
        }
        let mut config = Self::default();
        config.resolve_home_dir()?;
        Ok(config)
    }

    fn resolve_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.server.home_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let home = resolve_home_dir(configured, DEFAULT_HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.server.home_dir = home.to_string_lossy().into_owned();
        Ok(())
    }

    /// `--port` wins over every layer; each `-v` raises console verbosity one step.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        match verbose {
            0 => {}
            1 => self.logging.console_level = "debug".into(),
            _ => self.logging.console_level = "trace".into(),
        }
    }

    /// Typed `modules.<name>` section; absent means `T::default()`.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.modules.get(name) else {
            return Ok(T::default());
        };
        T::deserialize(raw).with_context(|| format!("invalid config for module '{name}'"))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }
}
