//! Error types for market data and forecast requests

use forecast_core::ForecastError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while fetching data or serving a forecast
#[derive(Debug, Error)]
pub enum StockError {
    /// Forecast engine failure, including unknown symbols and short histories
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Symbol is malformed
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Lookup query is blank or malformed
    #[error("Invalid lookup query: {0}")]
    InvalidQuery(String),

    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// What went wrong, in the terms a user cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SymbolNotFound,
    NotEnoughHistory,
    InvalidInput,
    Upstream,
    Engine,
}

impl StockError {
    /// No history exists for `symbol`
    pub fn no_data(symbol: impl Into<String>) -> Self {
        Self::Forecast(ForecastError::NoData {
            symbol: symbol.into(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Forecast(err) => match err {
                ForecastError::NoData { .. } => ErrorKind::SymbolNotFound,
                ForecastError::InsufficientData { .. } => ErrorKind::NotEnoughHistory,
                ForecastError::InvalidParameter { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::Engine,
            },
            Self::InvalidSymbol(_) | Self::InvalidQuery(_) => ErrorKind::InvalidInput,
            Self::ApiError(_)
            | Self::YahooFinanceError(_)
            | Self::NetworkError(_)
            | Self::JsonError(_) => ErrorKind::Upstream,
            Self::ConfigError(_) => ErrorKind::Engine,
        }
    }

    /// Message safe to show to an end user
    pub fn user_message(&self) -> String {
        match (self.kind(), self) {
            (ErrorKind::SymbolNotFound, Self::Forecast(ForecastError::NoData { symbol })) => {
                format!("No data found. Symbol {symbol} is not listed.")
            }
            (ErrorKind::NotEnoughHistory, Self::Forecast(err)) => {
                format!("Not enough price history to forecast. {err}")
            }
            (ErrorKind::InvalidInput, err) => err.to_string(),
            (ErrorKind::Upstream, _) => {
                "The market data provider could not be reached, please try again later".to_string()
            }
            _ => "Forecast engine error".to_string(),
        }
    }
}
