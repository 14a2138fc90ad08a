//! Error types for forecast-core

use crate::adapter::ModelKind;
use thiserror::Error;

/// Result type alias for forecast-core
pub type Result<T> = std::result::Result<T, ForecastError>;

/// A single model's internal computation failed
///
/// Recoverable at the orchestrator level: the other models still run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{model} model failed: {cause}")]
pub struct AdapterError {
    /// Which model failed
    pub model: ModelKind,
    /// Human readable cause (non-convergence, non-finite output, ...)
    pub cause: String,
}

impl AdapterError {
    /// Create a new adapter error
    pub fn new(model: ModelKind, cause: impl Into<String>) -> Self {
        Self {
            model,
            cause: cause.into(),
        }
    }
}

/// Error type for forecast runs
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The series holds no observations at all
    #[error("No price history available for {symbol}")]
    NoData { symbol: String },

    /// History shorter than the windowing or adapter minimums
    #[error("Not enough history for the {window} window: need {required} points, have {actual}")]
    InsufficientData {
        window: String,
        required: usize,
        actual: usize,
    },

    /// Metrics precondition: both sequences must have equal length
    #[error("Length mismatch: actual has {actual} points, predicted has {predicted}")]
    LengthMismatch { actual: usize, predicted: usize },

    /// Metrics precondition: at least two points are needed
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// One model failed
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Forecast dates disagree across models
    #[error("Forecast dates are not aligned: {0}")]
    Alignment(String),

    /// Every model failed, nothing to ensemble
    #[error("All models failed: {}", describe_failures(.0))]
    AllModelsFailed(Vec<AdapterError>),

    /// The business-day calendar produced the wrong number of dates
    #[error("Business-day calendar produced {got} forecast dates, expected {expected}")]
    CalendarDefect { expected: usize, got: usize },

    /// A configuration value is out of range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A price series violated its ordering or value invariants
    #[error("Invalid price series: {0}")]
    InvalidSeries(String),
}

impl ForecastError {
    /// Build an [`ForecastError::InvalidParameter`]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build an adapter failure for `model`
    pub fn adapter(model: ModelKind, cause: impl Into<String>) -> Self {
        Self::Adapter(AdapterError::new(model, cause))
    }

    /// Whether the orchestrator may continue without the failing component
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Adapter(_))
    }
}

fn describe_failures(failures: &[AdapterError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForecastError::LengthMismatch {
            actual: 10,
            predicted: 9,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch: actual has 10 points, predicted has 9"
        );

        let err = ForecastError::adapter(ModelKind::Sequence, "training diverged");
        assert_eq!(err.to_string(), "sequence model failed: training diverged");
    }

    #[test]
    fn test_all_models_failed_lists_each_model() {
        let err = ForecastError::AllModelsFailed(vec![
            AdapterError::new(ModelKind::Statistical, "singular system"),
            AdapterError::new(ModelKind::Simulation, "empty window"),
        ]);
        let message = err.to_string();
        assert!(message.contains("statistical model failed: singular system"));
        assert!(message.contains("simulation model failed: empty window"));
    }

    #[test]
    fn test_recoverable() {
        assert!(ForecastError::adapter(ModelKind::Simulation, "nan").is_recoverable());
        assert!(!ForecastError::Alignment("x".to_string()).is_recoverable());
        assert!(!ForecastError::DegenerateInput("x".to_string()).is_recoverable());
    }
}
