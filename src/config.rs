// config.rs
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // e.g. "info", "httpmeter=debug,tower_http=info"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Which value fills the `path` label.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathLabelMode {
    /// The request URL path, verbatim. One series per distinct path.
    #[default]
    Raw,
    /// The matched route template (e.g. `/items/{id}`), falling back to the raw path.
    Route,
}

/// Exponential bucket layout: `count` bounds starting at `start`, each `factor` times the previous.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    pub start: f64,
    pub factor: f64,
    pub count: usize,
}

impl BucketConfig {
    pub const LATENCY: BucketConfig = BucketConfig { start: 0.05, factor: 2.0, count: 16 };
    pub const SIZE: BucketConfig = BucketConfig { start: 100.0, factor: 3.0, count: 16 };
}

/// Metric families emitted for every request
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub path_label: PathLabelMode,
    pub requests_total: String,
    pub request_duration: String,
    pub response_size: String,
    pub latency_buckets: BucketConfig,
    pub size_buckets: BucketConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path_label: PathLabelMode::Raw,
            requests_total: "http_requests_total".to_string(),
            request_duration: "http_request_duration_seconds".to_string(),
            response_size: "http_request_size_bytes".to_string(),
            latency_buckets: BucketConfig::LATENCY,
            size_buckets: BucketConfig::SIZE,
        }
    }
}

/// Global configuration
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load config from `config/default.toml` and environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load config from `file` (or `config/default` when `None`), then `APP__*` overrides.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/default").required(false),
        };

        let settings = config::Config::builder()
            .add_source(source)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        Ok(cfg)
    }
}
