//! Numerical failure modes shared by the model implementations

use forecast_core::{ForecastError, ModelKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Why a model could not produce a number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Too few observations for the requested structure
    #[error("need at least {needed} observations, got {got}")]
    TooShort { needed: usize, got: usize },

    /// Normal equations were not positive definite
    #[error("least squares system is singular")]
    Singular,

    /// A NaN or infinity appeared in `stage`
    #[error("non-finite value during {0}")]
    NonFinite(&'static str),

    /// Log returns need strictly positive prices
    #[error("price {0} is not strictly positive")]
    NonPositivePrice(f64),

    /// No candidate model could be estimated
    #[error("no candidate order could be fitted: {0}")]
    NotConverged(String),

    #[error("invalid {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
}

impl ModelError {
    /// Attribute the failure to `model`
    pub fn into_forecast_error(self, model: ModelKind) -> ForecastError {
        ForecastError::adapter(model, self.to_string())
    }
}

/// Reject NaN and infinities coming out of `stage`
pub(crate) fn ensure_finite(value: f64, stage: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::NonFinite(stage))
    }
}
