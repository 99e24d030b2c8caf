//! Configuration loading and management.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Engine tuning and paths.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Club catalog, keyed by club identifier. An empty table means the
    /// built-in campus catalog.
    #[serde(default)]
    pub clubs: BTreeMap<String, ClubConfig>,
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Path of the snapshot document.
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Minutes between reminder sweeps.
    #[serde(default = "default_reminder_interval")]
    pub reminder_interval_minutes: u64,
    /// How far ahead of an event its reminder fires, in minutes.
    #[serde(default = "default_reminder_window")]
    pub reminder_window_minutes: i64,
    /// Attendance session duration when the command omits one, in minutes.
    #[serde(default = "default_session_minutes")]
    pub default_session_minutes: u32,
    /// Direct messages per second during an announcement fan-out.
    #[serde(default = "default_announce_rate")]
    pub announce_per_second: u32,
    /// Concurrent in-flight direct messages during a fan-out.
    #[serde(default = "default_announce_concurrency")]
    pub announce_concurrency: usize,
    /// Upper bound on a single outbound send, in seconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,
}

/// One club catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClubConfig {
    /// Display name (e.g., "Science Club").
    pub name: String,
    /// Club emoji used in rendered notices.
    pub emoji: String,
    /// Accent color as 0xRRGGBB.
    pub color: u32,
}

fn default_data_path() -> String {
    "clubd.json".to_string()
}

fn default_reminder_interval() -> u64 {
    30
}

fn default_reminder_window() -> i64 {
    60
}

fn default_session_minutes() -> u32 {
    5
}

fn default_announce_rate() -> u32 {
    1
}

fn default_announce_concurrency() -> usize {
    4
}

fn default_send_timeout() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            reminder_interval_minutes: default_reminder_interval(),
            reminder_window_minutes: default_reminder_window(),
            default_session_minutes: default_session_minutes(),
            announce_per_second: default_announce_rate(),
            announce_concurrency: default_announce_concurrency(),
            send_timeout_seconds: default_send_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
