// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::Deserialize;

use crate::error::{HoneywatchError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "honeywatch.toml";

pub const ENV_DASHBOARD_USER: &str = "HONEYWATCH_DASHBOARD_USER";
pub const ENV_DASHBOARD_PASSWORD: &str = "HONEYWATCH_DASHBOARD_PASSWORD";
pub const ENV_BOT_TOKEN: &str = "HONEYWATCH_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "HONEYWATCH_CHAT_ID";

/// Full process configuration. Static for the lifetime of the process.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ids: IdsConfig,
    pub honeypot: HoneypotConfig,
    pub watch: WatchConfig,
    pub dashboard: DashboardConfig,
    pub notify: NotifyConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdsConfig {
    /// Suricata eve.json on the host.
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HoneypotConfig {
    pub container: String,
    /// Log path inside the container.
    pub internal_log_path: String,
    /// Base name for the copied snapshot on the host. Each subcommand
    /// writes its own file next to it, see [`HoneypotConfig::snapshot_path_for`].
    pub snapshot_path: PathBuf,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self { log_path: PathBuf::from("/var/log/suricata/eve.json") }
    }
}

impl Default for HoneypotConfig {
    fn default() -> Self {
        Self {
            container: "honeypot-container".into(),
            internal_log_path: "/cowrie/cowrie-git/var/log/cowrie/cowrie.json".into(),
            snapshot_path: std::env::temp_dir().join("honeywatch_cowrie.json"),
            fetch_timeout_secs: 30,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { poll_interval_secs: 10 }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000, username: None, password: None }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            bot_token: None,
            chat_id: None,
            timeout_secs: 10,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self { endpoint: "http://ip-api.com/json".into(), timeout_secs: 5 }
    }
}

impl HoneypotConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// `honeywatch_cowrie.json` -> `honeywatch_cowrie.watch.json`.
    ///
    /// Subcommands run as separate processes and never share a snapshot file.
    pub fn snapshot_path_for(&self, command: &str) -> PathBuf {
        let stem = self
            .snapshot_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "honeywatch_cowrie".into());
        let name = match self.snapshot_path.extension() {
            Some(ext) => format!("{stem}.{command}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{command}"),
        };
        self.snapshot_path.with_file_name(name)
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl DashboardConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load configuration from `path`, then overlay secrets from the
/// environment. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut cfg = match fs::read_to_string(path) {
        Ok(text) => parse_config(&text)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn parse_config(text: &str) -> Result<Config> {
    Ok(toml::from_str(text)?)
}

impl Config {
    /// Environment values win over file values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DASHBOARD_USER) {
            self.dashboard.username = Some(v);
        }
        if let Some(v) = lookup(ENV_DASHBOARD_PASSWORD) {
            self.dashboard.password = Some(v);
        }
        if let Some(v) = lookup(ENV_BOT_TOKEN) {
            self.notify.bot_token = Some(v);
        }
        if let Some(v) = lookup(ENV_CHAT_ID) {
            self.notify.chat_id = Some(v);
        }
    }

    /// Credentials the alerter cannot start without.
    pub fn require_notify(&self) -> Result<(String, String)> {
        let token = required(&self.notify.bot_token, "notify.bot_token", ENV_BOT_TOKEN, "YOUR_BOT_TOKEN")?;
        let chat = required(&self.notify.chat_id, "notify.chat_id", ENV_CHAT_ID, "YOUR_CHAT_ID")?;
        Ok((token, chat))
    }

    /// Credentials the dashboard cannot start without.
    pub fn require_dashboard(&self) -> Result<(String, String)> {
        let user = required(&self.dashboard.username, "dashboard.username", ENV_DASHBOARD_USER, "")?;
        let pass = required(&self.dashboard.password, "dashboard.password", ENV_DASHBOARD_PASSWORD, "")?;
        Ok((user, pass))
    }
}

fn required(value: &Option<String>, key: &str, env: &str, placeholder: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() && (placeholder.is_empty() || !v.contains(placeholder)) => {
            Ok(v.to_string())
        }
        _ => Err(HoneywatchError::Config(format!("{key} is not set (set it in the config file or {env})"))),
    }
}
