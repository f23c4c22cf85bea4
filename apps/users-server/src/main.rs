use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbEngine, DbHandle};
use mimalloc::MiMalloc;
use runtime::AppConfig;
use users_info::{UsersInfo, UsersInfoConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// DSN used by `--mock`: a private in-memory SQLite database.
const MOCK_DSN: &str = "sqlite::memory:";

/// Users Service: CRUD HTTP API for the user resource
#[derive(Parser)]
#[command(name = "users-server", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database with a fresh schema
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    runtime::logging::init_logging_from_config(&config.logging, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "users-server starting");
    tracing::debug!(server = ?config.server, "effective server configuration");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, cli.mock).await,
        Commands::Check => check(&config, cli.mock),
    }
}

/// Typed module sections; unknown keys are rejected here, before anything starts.
fn module_configs(config: &AppConfig) -> Result<(UsersInfoConfig, ApiIngressConfig)> {
    Ok((
        config.module_config("users_info")?,
        config.module_config("api_ingress")?,
    ))
}

/// DSN handed to the pool: the mock database, or the configured URL with a
/// relative SQLite file anchored at `home_dir`.
fn database_dsn(config: &AppConfig, mock: bool) -> Result<String> {
    if mock {
        return Ok(MOCK_DSN.to_owned());
    }
    let url = config.database.url.trim();
    match DbEngine::from_dsn(url)? {
        DbEngine::Postgres => Ok(url.to_owned()),
        DbEngine::Sqlite => sqlite_under_home(url, Path::new(&config.server.home_dir)),
    }
}

fn sqlite_under_home(dsn: &str, home: &Path) -> Result<String> {
    if dsn.contains(":memory:") {
        return Ok(MOCK_DSN.to_owned());
    }
    let Some(rest) = dsn.strip_prefix("sqlite://") else {
        bail!("SQLite DSN must look like sqlite://<path> (got: {dsn})");
    };
    let (file, params) = match rest.split_once('?') {
        Some((file, params)) => (file, Some(params)),
        None => (rest, None),
    };
    if file.is_empty() {
        bail!("Empty SQLite path in DSN");
    }

    let path = home.join(file);
    let mut out = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));
    if let Some(params) = params {
        out.push('?');
        out.push_str(params);
    }
    Ok(out)
}

fn connect_opts(config: &AppConfig) -> ConnectOpts {
    ConnectOpts {
        max_conns: config.database.max_conns,
        acquire_timeout: Duration::from_secs(5),
        sqlite_busy_timeout: Duration::from_millis(config.database.busy_timeout_ms),
        create_sqlite_dirs: true,
    }
}

async fn run(config: AppConfig, mock: bool) -> Result<()> {
    let (users_cfg, ingress_cfg) = module_configs(&config)?;

    let dsn = database_dsn(&config, mock)?;
    let db = DbHandle::connect(&dsn, connect_opts(&config))
        .await
        .context("failed to connect to database")?;
    tracing::info!(engine = ?db.engine(), mock, "database connected");

    let bootstrap = mock || users_cfg.bootstrap_schema;
    let users = UsersInfo::init(&db, users_cfg);
    if bootstrap {
        users.migrate(&db).await?;
    }

    let timeout = Some(config.server.timeout_sec)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let host = ApiIngress::new(ingress_cfg, timeout);
    let router = host.rest_finalize(users.register_rest(host.rest_prepare()), &users.openapi())?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let served = host
        .serve(&bind_addr, router, api_ingress::shutdown_signal())
        .await;

    db.close().await;
    tracing::info!("users-server stopped");
    served
}

fn check(config: &AppConfig, mock: bool) -> Result<()> {
    module_configs(config)?;
    if !mock {
        DbEngine::from_dsn(&config.database.url)?;
    }

    tracing::info!("configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.server.home_dir = "/srv/users".into();
        config.database.url = url.into();
        config
    }

    #[test]
    fn relative_sqlite_file_moves_under_home() {
        let dsn = database_dsn(&with_url("sqlite://database/users.db"), false).unwrap();
        assert_eq!(dsn, "sqlite:///srv/users/database/users.db");
    }

    #[test]
    fn sqlite_params_are_kept() {
        let dsn = sqlite_under_home("sqlite://x.db?mode=rwc", Path::new("/h")).unwrap();
        assert_eq!(dsn, "sqlite:///h/x.db?mode=rwc");
        assert!(sqlite_under_home("sqlite://?mode=rwc", Path::new("/h")).is_err());
    }

    #[test]
    fn in_memory_sqlite_is_left_alone() {
        for url in ["sqlite::memory:", "sqlite://:memory:"] {
            assert_eq!(database_dsn(&with_url(url), false).unwrap(), MOCK_DSN);
        }
    }

    #[test]
    fn postgres_url_passes_through_unless_mocked() {
        let config = with_url("postgresql://localhost/nonexistent");
        assert_eq!(
            database_dsn(&config, false).unwrap(),
            "postgresql://localhost/nonexistent"
        );
        assert_eq!(database_dsn(&config, true).unwrap(), MOCK_DSN);
    }

    #[test]
    fn unsupported_scheme_is_reported() {
        let err = database_dsn(&with_url("mysql://h/db"), false).unwrap_err();
        assert!(err.to_string().contains("Unsupported database type: mysql"));
    }

    #[test]
    fn check_rejects_unknown_module_keys() {
        let mut config = AppConfig::default();
        config
            .modules
            .insert("users_info".into(), serde_json::json!({ "page_size": 5 }));
        assert!(check(&config, true).is_err());
    }
}
