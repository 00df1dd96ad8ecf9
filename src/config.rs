//! Configuration loading.
//!
//! The bridge reads a JSON file named on the command line or via the
//! `PVE_BRIDGE_CONFIG` environment variable. Credentials may be overridden
//! with `PVE_BRIDGE_PASSWORD` so the file does not have to hold a secret.

use crate::core::domain::error::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_ENV: &str = "PVE_BRIDGE_CONFIG";
pub const PASSWORD_ENV: &str = "PVE_BRIDGE_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub proxmox: ProxmoxConfig,
    #[serde(default)]
    pub options: Options,
}

/// Connection and credential settings for the Proxmox API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxmoxConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_realm")]
    pub realm: String,
    /// Verify the API's TLS certificate. Off by default because most Proxmox
    /// installs run with a self-signed certificate.
    #[serde(default)]
    pub verify_ssl: bool,
}

impl ProxmoxConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

/// Tunables with serviceable defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Pool used when a creation request names none. When absent the
    /// resolver auto-detects one.
    pub default_storage: Option<String>,
    /// Bound on a single task wait, in seconds.
    pub task_timeout_secs: u64,
    /// Interval between task status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Bound on a guest-agent command wait, in seconds.
    pub exec_timeout_secs: u64,
    /// Optional upstream request rate limit.
    pub rate_limit: Option<RateLimit>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_storage: None,
            task_timeout_secs: 300,
            poll_interval_ms: 1000,
            exec_timeout_secs: 30,
            rate_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimit {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Loads configuration from `path`, or from `PVE_BRIDGE_CONFIG` when no path
/// is given. `PVE_BRIDGE_PASSWORD` overrides the file's password field.
pub fn load(path: Option<&Path>) -> BridgeResult<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::var(CONFIG_ENV)
            .map(Into::into)
            .map_err(|_| {
                BridgeError::validation(
                    "config",
                    format!("no config path given and {CONFIG_ENV} is not set"),
                )
            })?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        BridgeError::validation("config", format!("cannot read {}: {e}", path.display()))
    })?;
    let mut config: Config = serde_json::from_str(&raw).map_err(|e| {
        BridgeError::validation("config", format!("cannot parse {}: {e}", path.display()))
    })?;

    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        config.proxmox.password = password;
    }

    if config.proxmox.host.is_empty() {
        return Err(BridgeError::validation("proxmox.host", "must not be empty"));
    }
    if config.proxmox.username.is_empty() {
        return Err(BridgeError::validation(
            "proxmox.username",
            "must not be empty",
        ));
    }

    Ok(config)
}

fn default_port() -> u16 {
    8006
}

fn default_realm() -> String {
    "pam".to_string()
}
