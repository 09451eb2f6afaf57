use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::prelude::deserialize_vec_from_string_or_vec;

use crate::congress::{TimeoutClass, ToolGroup};

/// Application configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with CMCP_ prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Congress.gov API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default API key. Required; there is no compiled-in default.
    #[serde(default)]
    pub api_key: String,

    /// Outbound User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestConfig {
    /// Ceiling for a single attempt on ordinary endpoints.
    #[serde(default = "default_standard_timeout_secs")]
    pub standard_timeout_secs: u64,

    /// Ceiling for a single attempt on endpoints known to be slow.
    #[serde(default = "default_extended_timeout_secs")]
    pub extended_timeout_secs: u64,

    /// Total attempts per logical call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap on one backoff delay, and on any Retry-After hint we are willing to wait for.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl RequestConfig {
    #[must_use]
    pub const fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Standard => Duration::from_secs(self.standard_timeout_secs),
            TimeoutClass::Extended => Duration::from_secs(self.extended_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP server bind address.
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Resource groups exposed as tools. Empty means every group.
    /// Accepts either an array or comma-separated string.
    /// Example: `["bills", "members"]` or `"bills,members"`
    #[serde(default, deserialize_with = "deserialize_groups")]
    pub enabled_groups: Vec<String>,
}

impl ToolsConfig {
    /// Resolve the configured names, ignoring unknown ones. `validate` reports those.
    #[must_use]
    pub fn groups(&self) -> Vec<ToolGroup> {
        if self.enabled_groups.is_empty() {
            return ToolGroup::ALL.to_vec();
        }
        ToolGroup::ALL
            .into_iter()
            .filter(|group| {
                self.enabled_groups
                    .iter()
                    .any(|name| ToolGroup::parse(name) == Some(*group))
            })
            .collect()
    }
}

/// Deserialize groups from comma-separated string or array, filtering empty values.
fn deserialize_groups<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups: Vec<String> = deserialize_vec_from_string_or_vec(deserializer)?;
    Ok(groups
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

// These functions cannot be const because serde uses function pointers for defaults
fn default_base_url() -> String {
    "https://api.congress.gov/v3".to_string()
}

fn default_user_agent() -> String {
    format!("congress-mcp/{}", env!("CARGO_PKG_VERSION"))
}

#[allow(clippy::missing_const_for_fn)]
fn default_standard_timeout_secs() -> u64 {
    30
}

#[allow(clippy::missing_const_for_fn)]
fn default_extended_timeout_secs() -> u64 {
    45
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_attempts() -> u32 {
    3
}

#[allow(clippy::missing_const_for_fn)]
fn default_initial_backoff_ms() -> u64 {
    1000
}

#[allow(clippy::missing_const_for_fn)]
fn default_backoff_multiplier() -> f64 {
    2.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_backoff_ms() -> u64 {
    8000
}

#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            standard_timeout_secs: default_standard_timeout_secs(),
            extended_timeout_secs: default_extended_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are merged in priority order:
    /// 1. Struct defaults (lowest)
    /// 2. config.yaml file (if exists)
    /// 3. Environment variables with CMCP_ prefix (highest)
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("CMCP_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upstream.api_key is required. Set CMCP_UPSTREAM__API_KEY environment variable or configure in config.yaml.".into(),
            ));
        }

        let base_url = &self.upstream.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "upstream.base_url must start with http:// or https://, got: '{base_url}'"
            )));
        }

        if self.request.standard_timeout_secs == 0 || self.request.extended_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request timeouts cannot be 0".into(),
            ));
        }

        if self.request.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "request.max_attempts cannot be 0".into(),
            ));
        }

        let multiplier = self.request.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::Validation(format!(
                "request.backoff_multiplier must be at least 1.0, got: {}",
                self.request.backoff_multiplier
            )));
        }

        if self.request.initial_backoff_ms > self.request.max_backoff_ms {
            return Err(ConfigError::Validation(
                "request.initial_backoff_ms cannot exceed request.max_backoff_ms".into(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".into()));
        }

        for name in &self.tools.enabled_groups {
            if ToolGroup::parse(name).is_none() {
                let known: Vec<&str> = ToolGroup::ALL.iter().map(|g| g.as_str()).collect();
                return Err(ConfigError::Validation(format!(
                    "tools.enabled_groups contains unknown group '{name}'. Known groups: {}",
                    known.join(", ")
                )));
            }
        }

        Ok(())
    }
}
