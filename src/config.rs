//! Configuration management for pwdash
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Env var overriding `dashboard.page_url`
pub const ENV_PAGE_URL: &str = "PWDASH_PAGE_URL";
/// Env var overriding `dashboard.poll_interval_ms`
pub const ENV_POLL_INTERVAL_MS: &str = "PWDASH_POLL_INTERVAL_MS";
/// Env var overriding `web.port`
pub const ENV_WEB_PORT: &str = "PWDASH_WEB_PORT";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Gateway polling configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Gauge feed server binding
    #[serde(default)]
    pub web: WebConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gateway polling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// URL of the page the dashboard is served from; endpoints are resolved
    /// against its scheme, host and port
    pub page_url: String,

    /// Refresh period in milliseconds
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds. Unset means requests may hang
    /// until the gateway answers.
    pub request_timeout_ms: Option<u64>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the gauge feed at all
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Console level, falls back to `level`
    pub console_level: Option<String>,

    /// File level, falls back to `level`
    pub file_level: Option<String>,

    /// Level applied to the SSE log stream, falls back to `level`
    pub web_level: Option<String>,

    /// Path to log file (its directory is used for rotation)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl DashboardConfig {
    /// Refresh period as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Request timeout as a [`Duration`], if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists,
    /// apply environment overrides and validate
    pub fn load() -> Result<Self> {
        let default_paths = [
            "pwdash.yaml",
            "/data/pwdash.yaml",
            "/etc/pwdash/config.yaml",
        ];

        let mut config = default_paths
            .iter()
            .find(|p| Path::new(p).exists())
            .map(Self::from_file)
            .transpose()?
            .unwrap_or_default();

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Apply overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_PAGE_URL).filter(|v| !v.trim().is_empty()) {
            self.dashboard.page_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.dashboard.poll_interval_ms = raw.trim().parse().map_err(|_| {
                DashError::validation(ENV_POLL_INTERVAL_MS, "must be an integer")
            })?;
        }
        if let Some(raw) = lookup(ENV_WEB_PORT) {
            self.web.port = raw
                .trim()
                .parse()
                .map_err(|_| DashError::validation(ENV_WEB_PORT, "must be a port number"))?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.dashboard.page_url).map_err(|e| {
            DashError::validation("dashboard.page_url".to_string(), e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DashError::validation(
                "dashboard.page_url",
                "Scheme must be http or https",
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(DashError::validation(
                "dashboard.page_url",
                "URL must include a host",
            ));
        }

        if self.dashboard.poll_interval_ms == 0 {
            return Err(DashError::validation(
                "dashboard.poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.dashboard.request_timeout_ms == Some(0) {
            return Err(DashError::validation(
                "dashboard.request_timeout_ms",
                "Must be greater than 0 when set",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(DashError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
