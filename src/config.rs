//! ==============================================================================
//! config.rs - dashboard configuration loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: where the controller lives (base url, optional timeout).
//!     - EndpointsConfig: path templates for every endpoint. `{id}` and
//!       `{range}` are substituted at request time. both the `/hardware`
//!       and `/api` families are listed, neither is assumed.
//!     - PollingConfig: refresh interval and which snapshot feed to poll.
//!     - HistoryConfig: the chart range selected on startup.
//!     - WebConfig: the local page view.
//!     - LoggingConfig: level, output format, per-snapshot logging.
//!
//! ==============================================================================

use crate::error::DashboardError;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// unset means requests may hang as long as the controller does
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:5000".to_string(), request_timeout_ms: None }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub current: String,
    pub live: String,
    pub lamp_control: String,
    pub lamp_status: String,
    pub lamp_update: String,
    pub com_status: String,
    pub api_current: String,
    pub history: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            current: "/hardware/sensor/current".to_string(),
            live: "/hardware/sensor/sensor-data".to_string(),
            lamp_control: "/hardware/lamp/lampcontrol".to_string(),
            lamp_status: "/hardware/lamp/status".to_string(),
            lamp_update: "/hardware/lamp/status/{id}".to_string(),
            com_status: "/hardware/com-status".to_string(),
            api_current: "/api/sensor/current".to_string(),
            history: "/api/sensor/history?range={range}".to_string(),
        }
    }
}

impl EndpointsConfig {
    fn templates(&self) -> [(&'static str, &str); 8] {
        [
            ("current", self.current.as_str()),
            ("live", self.live.as_str()),
            ("lamp_control", self.lamp_control.as_str()),
            ("lamp_status", self.lamp_status.as_str()),
            ("lamp_update", self.lamp_update.as_str()),
            ("com_status", self.com_status.as_str()),
            ("api_current", self.api_current.as_str()),
            ("history", self.history.as_str()),
        ]
    }
}

/// which snapshot endpoints the refresh cycle reads
///
/// `hardware`: `current` on load and manual refresh, `live` on every tick.
/// `api`: `api_current` for both.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFeed {
    #[default]
    Hardware,
    Api,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub feed: SnapshotFeed,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 30_000, feed: SnapshotFeed::Hardware }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub default_range: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { default_range: "24h".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { enabled: true, bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// log every rendered snapshot, not just failures
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty, show_sensor_data: true }
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: DashboardConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    ///
    /// runs before logging is initialised, so it reports straight to stdout/stderr.
    pub fn load_or_default() -> Self {
        let paths = [
            PathBuf::from("config").join("dashboard.toml"),
            PathBuf::from("..").join("config").join("dashboard.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        eprintln!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        eprintln!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    /// reject values the refresh cycle cannot run with
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.polling.interval_ms == 0 {
            return Err(DashboardError::Config("polling.interval_ms must be greater than zero".into()));
        }
        reqwest::Url::parse(&self.server.base_url).map_err(|e| {
            DashboardError::Config(format!("server.base_url '{}' is not a valid url: {}", self.server.base_url, e))
        })?;
        for (name, template) in self.endpoints.templates() {
            if template.trim().is_empty() {
                return Err(DashboardError::Config(format!("endpoints.{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│         DASHBOARD CONFIGURATION         │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Controller: {}", self.server.base_url);
        println!("│ Feed: {:?}", self.polling.feed);
        println!("│ Poll Interval: {}ms", self.polling.interval_ms);
        println!("│ History Range: {}", self.history.default_range);
        if self.web.enabled {
            println!("│ Web View: http://{}", self.web.bind);
        }
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
