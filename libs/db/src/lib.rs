//! Connection pool for the users store.
//!
//! One `sqlx::AnyPool` serves both backends: PostgreSQL in production and SQLite
//! for local runs, `--mock` and tests. Which one is picked depends only on the
//! DSN scheme.
//!
//! ```rust,no_run
//! # async fn demo() -> db::Result<()> {
//! let db = db::DbHandle::connect("sqlite::memory:", db::ConnectOpts::default()).await?;
//! sqlx::query("SELECT 1").execute(db.pool()).await?;
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid database DSN '{dsn}': {reason}")]
    InvalidDsn { dsn: String, reason: String },

    #[error("Unsupported database type: {0}")]
    UnsupportedScheme(String),

    #[error("{0:?} support is not compiled in")]
    EngineDisabled(DbEngine),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

impl DbEngine {
    /// Engine named by the DSN scheme (`postgres`, `postgresql`, `sqlite`).
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let dsn = dsn.trim();
        if dsn.is_empty() {
            return Err(DbError::InvalidDsn {
                dsn: String::new(),
                reason: "empty".into(),
            });
        }
        let scheme = match Url::parse(dsn) {
            Ok(url) => url.scheme().to_owned(),
            // `sqlite://:memory:` has no valid authority but is still SQLite
            Err(_) if dsn.starts_with("sqlite:") => "sqlite".to_owned(),
            Err(e) => {
                return Err(DbError::InvalidDsn {
                    dsn: dsn.to_owned(),
                    reason: e.to_string(),
                })
            }
        };
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(DbError::UnsupportedScheme(scheme)),
        }
    }

    fn ensure_compiled(self) -> Result<()> {
        let enabled = match self {
            Self::Postgres => cfg!(feature = "pg"),
            Self::Sqlite => cfg!(feature = "sqlite"),
        };
        if enabled {
            Ok(())
        } else {
            Err(DbError::EngineDisabled(self))
        }
    }
}

/// Pool tuning. `sqlite_busy_timeout` and `create_sqlite_dirs` only matter for
/// SQLite files.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: u32,
    pub acquire_timeout: Duration,
    pub sqlite_busy_timeout: Duration,
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: 10,
            acquire_timeout: Duration::from_secs(30),
            sqlite_busy_timeout: Duration::from_millis(5000),
            create_sqlite_dirs: true,
        }
    }
}

#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: AnyPool,
    dsn: String,
}

impl DbHandle {
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = DbEngine::from_dsn(dsn)?;
        engine.ensure_compiled()?;
        sqlx::any::install_default_drivers();

        let base = AnyPoolOptions::new()
            .max_connections(opts.max_conns.max(1))
            .acquire_timeout(opts.acquire_timeout);

        let (pool_opts, dsn) = match engine {
            DbEngine::Postgres => (base, dsn.trim().to_owned()),
            DbEngine::Sqlite if is_in_memory(dsn) => {
                // a second connection would open a second, empty database
                let single = base
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None);
                (single, dsn.trim().to_owned())
            }
            DbEngine::Sqlite => {
                let busy_ms = opts.sqlite_busy_timeout.as_millis();
                let with_pragma = base.after_connect(move |conn, _meta| {
                    Box::pin(async move {
                        sqlx::query(&format!("PRAGMA busy_timeout = {busy_ms}"))
                            .execute(&mut *conn)
                            .await?;
                        Ok(())
                    })
                });
                (with_pragma, sqlite_file_dsn(dsn.trim(), opts.create_sqlite_dirs)?)
            }
        };

        let pool = pool_opts.connect(&dsn).await?;
        tracing::debug!(?engine, "database pool ready");
        Ok(Self { engine, pool, dsn })
    }

    pub async fn close(self) {
        self.pool.close().await
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN the pool actually connected with, after SQLite adjustments.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

fn is_in_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Adds `mode=rwc` (create if missing) unless a mode is already given, and
/// optionally creates the parent directory of the database file.
fn sqlite_file_dsn(dsn: &str, create_dirs: bool) -> Result<String> {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    let (file, params) = rest.split_once('?').unwrap_or((rest, ""));

    if create_dirs && !file.starts_with("file:") {
        match Path::new(file).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
            _ => {}
        }
    }

    if params.is_empty() {
        Ok(format!("{dsn}?mode=rwc"))
    } else if params.split('&').any(|p| p.starts_with("mode=")) {
        Ok(dsn.to_owned())
    } else {
        Ok(format!("{dsn}&mode=rwc"))
    }
}
