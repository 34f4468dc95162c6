//! Configuration management for the eloverblik client
//!
//! This module handles loading, validation, and management of the client
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{EloverblikError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Customer API connection settings
    pub api: ApiConfig,

    /// Metering point queried when none is given on the command line
    pub metering_point: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Customer API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the customer API, without trailing `/api`
    pub base_url: String,

    /// Long-lived refresh token generated on eloverblik.dk
    pub refresh_token: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt on transient statuses
    pub max_retries: u32,

    /// Backoff base in seconds; attempt n sleeps `factor * 2^(n-1)`
    pub backoff_factor_secs: f64,

    /// HTTP statuses treated as transient
    pub retry_statuses: Vec<u16>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory or file path for the rolling log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to the console (stderr)
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.eloverblik.dk/CustomerApi".to_string(),
            refresh_token: String::new(),
            timeout_secs: 5,
            max_retries: 3,
            backoff_factor_secs: 60.0,
            retry_statuses: vec![400, 429, 500, 502, 503, 504],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            file: "/tmp/eloverblik.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from the first default location that exists, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::default_paths()
            .into_iter()
            .find(|p| p.exists())
            .map(Self::from_file)
            .transpose()?
            .unwrap_or_default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("eloverblik.yaml")];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config").join("eloverblik.yaml"));
        }
        paths.push(PathBuf::from("/etc/eloverblik/config.yaml"));
        paths
    }

    /// Apply `ELOVERBLIK_*` environment variables on top of the loaded values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an explicit lookup, so
    /// tests do not have to mutate the process environment
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("ELOVERBLIK_REFRESH_TOKEN") {
            self.api.refresh_token = token;
        }
        if let Some(point) = non_empty("ELOVERBLIK_METERING_POINT") {
            self.metering_point = Some(point);
        }
        if let Some(url) = non_empty("ELOVERBLIK_BASE_URL") {
            self.api.base_url = url;
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(EloverblikError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(EloverblikError::validation(
                "api.base_url",
                "Base URL must use http or https",
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(EloverblikError::validation(
                "api.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if !self.api.backoff_factor_secs.is_finite() || self.api.backoff_factor_secs < 0.0 {
            return Err(EloverblikError::validation(
                "api.backoff_factor_secs",
                "Must be a non-negative number",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|_| EloverblikError::validation("logging.level", "Unknown log level"))?;

        Ok(())
    }
}
