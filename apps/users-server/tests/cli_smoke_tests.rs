//! End-to-end checks of the `users-server` binary: argument parsing, config
//! validation and a short `run` against the mock database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_users-server");

/// Console-only logging keeps test runs from writing log files.
const QUIET_LOGGING: &str = "logging:\n  console_level: warn\n  file: \"\"\n";

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    /// Writes `server` rooted in the sandbox plus `extra` YAML; returns the file path.
    fn config(&self, extra: &str) -> PathBuf {
        self.config_with_host("127.0.0.1", extra)
    }

    fn config_with_host(&self, host: &str, extra: &str) -> PathBuf {
        let path = self.dir.path().join("users.yaml");
        let home = self.dir.path().join("home");
        let yaml = format!(
            "server:\n  home_dir: \"{}\"\n  host: \"{host}\"\n  port: 0\n{QUIET_LOGGING}{extra}",
            home.to_string_lossy().replace('\\', "/")
        );
        std::fs::write(&path, yaml).expect("write config");
        path
    }
}

fn users_server(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("spawn users-server")
}

fn with_config(config: &Path, args: &[&str]) -> Output {
    let config = config.to_string_lossy();
    let mut all = vec!["--config", config.as_ref()];
    all.extend_from_slice(args);
    users_server(&all)
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn help_lists_subcommands_and_flags() {
    let out = users_server(&["--help"]);
    assert!(out.status.success());
    let text = stdout(&out);
    for needle in ["Usage:", "run", "check", "--config", "--port", "--mock", "--print-config"] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }

    let run_help = stdout(&users_server(&["run", "--help"]));
    assert!(run_help.contains("Start the server"));
    let check_help = stdout(&users_server(&["check", "--help"]));
    assert!(check_help.contains("Check configuration"));
}

#[test]
fn version_is_printed() {
    let out = users_server(&["--version"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains(concat!("users-server ", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn unknown_subcommand_is_rejected() {
    let out = users_server(&["serve-forever"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("error"));
}

#[test]
fn missing_config_file_is_reported() {
    for flag in ["--config", "-c"] {
        let out = users_server(&[flag, "/nonexistent/users.yaml", "check"]);
        assert!(!out.status.success());
        assert!(
            stderr(&out).contains("config file not found"),
            "{flag}: {}",
            stderr(&out)
        );
    }
}

#[test]
fn malformed_yaml_is_reported() {
    let sandbox = Sandbox::new();
    let path = sandbox.dir.path().join("broken.yaml");
    std::fs::write(&path, "server: [unclosed").unwrap();

    let out = with_config(&path, &["check"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Failed to parse yaml config"), "{}", stderr(&out));
}

#[test]
fn check_accepts_a_complete_config() {
    let sandbox = Sandbox::new();
    let config = sandbox.config(
        "database:\n  url: \"sqlite://database/users.db\"\nmodules:\n  users_info:\n    default_limit: 25\n  api_ingress:\n    cors_enabled: true\n",
    );

    let out = with_config(&config, &["check"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Configuration check passed"));
    assert!(text.contains("default_limit: 25"));
    assert!(text.contains("cors_enabled: true"));
}

#[test]
fn check_rejects_unknown_module_keys() {
    let sandbox = Sandbox::new();
    let config = sandbox.config("modules:\n  users_info:\n    page_size: 5\n");

    let out = with_config(&config, &["check"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("users_info"), "{}", stderr(&out));
}

#[test]
fn check_rejects_unsupported_database() {
    let sandbox = Sandbox::new();
    let config = sandbox.config("database:\n  url: \"mysql://localhost/app\"\n");

    let out = with_config(&config, &["check"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Unsupported database type"), "{}", stderr(&out));

    let mocked = with_config(&config, &["--mock", "check"]);
    assert!(mocked.status.success(), "{}", stderr(&mocked));
}

#[test]
fn print_config_applies_cli_port() {
    let sandbox = Sandbox::new();
    let config = sandbox.config("");

    let out = with_config(&config, &["--port", "9191", "--print-config"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("port: 9191"), "{text}");
    assert!(text.contains("sqlite://database/users.db"));
}

#[test]
fn run_rejects_bad_bind_address() {
    let sandbox = Sandbox::new();
    let config = sandbox.config_with_host("not a host", "");

    let out = with_config(&config, &["--mock", "run"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid bind address"), "{}", stderr(&out));
}

#[tokio::test]
async fn run_with_mock_database_stays_up() {
    let sandbox = Sandbox::new();
    let config = sandbox.config("");

    let child = tokio::process::Command::new(BIN)
        .arg("--config")
        .arg(&config)
        .args(["--mock", "run"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(Duration::from_secs(3), child).await {
        Err(_elapsed) => {}
        Ok(Ok(out)) => panic!("server exited early ({}): {}", out.status, stderr(&out)),
        Ok(Err(e)) => panic!("failed to spawn server: {e}"),
    }
}
