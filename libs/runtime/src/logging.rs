//! Process-wide `tracing` setup: a human-readable console layer plus an optional
//! JSON file layer with size-based rotation. `log` records are bridged in.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;

type RotatingFile = Mutex<FileRotate<AppendTimestamp>>;

/// Unknown names fall back to `info`.
fn level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::INFO)
}

fn log_path(file: &str, home_dir: &Path) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        home_dir.join(file)
    }
}

fn open_rotating(path: &Path, cfg: &LoggingConfig) -> std::io::Result<RotatingFile> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let keep = if cfg.max_backups > 0 {
        FileLimit::MaxFiles(cfg.max_backups)
    } else {
        FileLimit::Age(chrono::Duration::days(i64::from(cfg.max_age_days.max(1))))
    };
    let max_bytes = cfg.max_size_mb.max(1).saturating_mul(1024 * 1024);
    Ok(Mutex::new(FileRotate::new(
        path,
        AppendTimestamp::default(keep),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    )))
}

/// `None` when the file sink is disabled or cannot be opened (reported on stderr).
fn file_sink(cfg: &LoggingConfig, home_dir: &Path) -> Option<RotatingFile> {
    if cfg.file.trim().is_empty() || level(&cfg.file_level) == LevelFilter::OFF {
        return None;
    }
    let path = log_path(cfg.file.trim(), home_dir);
    match open_rotating(&path, cfg) {
        Ok(sink) => Some(sink),
        Err(e) => {
            eprintln!("log file {} disabled: {e}", path.display());
            None
        }
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, replaces the console
/// level. A second call is a no-op.
pub fn init_logging_from_config(cfg: &LoggingConfig, home_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level(&cfg.console_level).into()));
    let console = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_filter(console_filter);

    let file = file_sink(cfg, home_dir).map(|sink| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_current_span(true)
            .with_writer(sink)
            .with_filter(level(&cfg.file_level))
    });

    let _ = Registry::default().with(console).with(file).try_init();
}
