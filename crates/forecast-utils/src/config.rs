//! Application configuration shared by the binaries

use crate::logging::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading the application configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Process-level configuration for the web server and CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port the HTTP server binds to
    pub port: u16,
    /// Logging verbosity and format
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "stock-forecast".to_string(),
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from process environment variables
    ///
    /// Recognised keys: `APP_ENV`, `HOST`, `PORT`, `LOG_LEVEL`, `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup, missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup("APP_ENV") {
            config.environment = env;
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log.format = LogFormat::parse(&format);
        }

        Ok(config)
    }

    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
