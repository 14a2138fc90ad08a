//! Shared utilities for stock-forecast
//!
//! This crate provides common functionality used across the workspace:
//! tracing setup driven by an explicit [`LogConfig`] and the application
//! level [`AppConfig`] loaded from the environment.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError};
pub use logging::{LogConfig, LogFormat, init_tracing};
