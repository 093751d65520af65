//! Layering tests for configuration loaded from files, environment, and flags.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use mcp_config::{Config, LogFormat};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe on the 2024 edition; the mutex keeps
        // overrides serialised across tests.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("mcpd")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn cli_flags_override_defaults() {
    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let config = Config::load_from_iter(args(&[
        "--handler-timeout-ms",
        "250",
        "--log-format",
        "compact",
        "--max-handler-workers",
        "8",
    ]))
    .expect("load config");

    assert_eq!(config.handler_timeout_ms, 250);
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.max_handler_workers(), 8);
    assert_eq!(config.max_in_flight(), mcp_config::DEFAULT_MAX_IN_FLIGHT);
}

#[test]
fn config_file_values_are_applied() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("mcp.toml");
    fs::write(&path, "max_in_flight = 4\nlog_filter = \"debug\"\n").expect("write config");

    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let config = Config::load_from_iter(vec![
        OsString::from("mcpd"),
        OsString::from("--config-path"),
        path.into_os_string(),
    ])
    .expect("load config");

    assert_eq!(config.max_in_flight(), 4);
    assert_eq!(config.log_filter(), "debug");
}

#[test]
fn environment_overrides_are_applied() {
    let _env = EnvOverride::set_var("MCP_MAX_MESSAGE_BYTES", OsStr::new("2048"));
    let config = Config::load_from_iter(args(&[])).expect("load config");
    assert_eq!(config.max_message_bytes(), 2048);
}
