//! Configuration for forecast runs

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Default length of the validation window in calendar days
pub const DEFAULT_VALIDATION_DAYS: u32 = 90;
/// Default number of business days to forecast
pub const DEFAULT_FORECAST_DAYS: u32 = 30;
/// Longest validation window accepted, in calendar days
pub const MAX_VALIDATION_DAYS: u32 = 3650;
/// Longest forecast horizon accepted, in business days
pub const MAX_FORECAST_DAYS: u32 = 365;

/// Validation window length and forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonConfig {
    /// Calendar days of history held out for walk-forward validation
    pub validation_days: u32,
    /// Business days to forecast past the last observation
    pub forecast_days: u32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            validation_days: DEFAULT_VALIDATION_DAYS,
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }
}

impl HorizonConfig {
    /// Create and validate a horizon
    pub fn new(validation_days: u32, forecast_days: u32) -> Result<Self> {
        let horizon = Self {
            validation_days,
            forecast_days,
        };
        horizon.validate()?;
        Ok(horizon)
    }

    /// Both lengths must be positive and within their maximums
    pub fn validate(&self) -> Result<()> {
        check_days("validation_days", self.validation_days, MAX_VALIDATION_DAYS)?;
        check_days("forecast_days", self.forecast_days, MAX_FORECAST_DAYS)
    }
}

/// What the orchestrator does when exactly one model (or more, but not all)
/// fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Continue with the remaining models and flag the missing one
    #[default]
    Degrade,
    /// Fail the whole run
    Abort,
}

impl FailurePolicy {
    /// Parse `degrade` or `abort`, case-insensitively
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "abort" => Ok(Self::Abort),
            other => Err(ForecastError::invalid_parameter(
                "failure_policy",
                format!("expected degrade or abort, got {other}"),
            )),
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Horizon used when the caller does not supply one
    pub horizon: HorizonConfig,
    /// Partial-failure policy
    pub failure_policy: FailurePolicy,
}

impl ForecastConfig {
    /// Set the default horizon
    pub fn with_horizon(mut self, horizon: HorizonConfig) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the partial-failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Read `FORECAST_VALIDATION_DAYS`, `FORECAST_DAYS` and
    /// `FORECAST_FAILURE_POLICY` through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut horizon = HorizonConfig::default();

        if let Some(raw) = lookup("FORECAST_VALIDATION_DAYS") {
            horizon.validation_days = parse_days("validation_days", &raw)?;
        }
        if let Some(raw) = lookup("FORECAST_DAYS") {
            horizon.forecast_days = parse_days("forecast_days", &raw)?;
        }
        horizon.validate()?;

        let failure_policy = match lookup("FORECAST_FAILURE_POLICY") {
            Some(raw) => FailurePolicy::parse(&raw)?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            horizon,
            failure_policy,
        })
    }

    /// Read the horizon from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn check_days(name: &str, days: u32, max: u32) -> Result<()> {
    if days == 0 {
        return Err(ForecastError::invalid_parameter(
            name,
            "must be a positive integer",
        ));
    }
    if days > max {
        return Err(ForecastError::invalid_parameter(
            name,
            format!("must be at most {max}"),
        ));
    }
    Ok(())
}

fn parse_days(name: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ForecastError::invalid_parameter(name, format!("not a positive integer: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_horizon() {
        let horizon = HorizonConfig::default();
        assert_eq!(horizon.validation_days, 90);
        assert_eq!(horizon.forecast_days, 30);
        assert!(horizon.validate().is_ok());
    }

    #[test]
    fn test_zero_lengths_rejected() {
        assert!(HorizonConfig::new(0, 30).is_err());
        assert!(HorizonConfig::new(90, 0).is_err());
        assert!(HorizonConfig::new(1, 1).is_ok());
    }

    #[test]
    fn test_upper_bounds() {
        assert!(HorizonConfig::new(MAX_VALIDATION_DAYS, MAX_FORECAST_DAYS).is_ok());
        assert!(matches!(
            HorizonConfig::new(90, MAX_FORECAST_DAYS + 1),
            Err(ForecastError::InvalidParameter { ref name, .. }) if name == "forecast_days"
        ));
        assert!(matches!(
            HorizonConfig::new(u32::MAX, 30),
            Err(ForecastError::InvalidParameter { ref name, .. }) if name == "validation_days"
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = ForecastConfig::from_lookup(|key| match key {
            "FORECAST_VALIDATION_DAYS" => Some("60".to_string()),
            "FORECAST_DAYS" => Some(" 10 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.horizon, HorizonConfig::new(60, 10).unwrap());
        assert_eq!(config.failure_policy, FailurePolicy::Degrade);

        let err = ForecastConfig::from_lookup(|key| {
            (key == "FORECAST_DAYS").then(|| "-3".to_string())
        });
        assert!(matches!(err, Err(ForecastError::InvalidParameter { .. })));
    }

    #[test]
    fn test_failure_policy_from_lookup() {
        let config = ForecastConfig::from_lookup(|key| {
            (key == "FORECAST_FAILURE_POLICY").then(|| "Abort".to_string())
        })
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Abort);

        assert!(FailurePolicy::parse("sometimes").is_err());
    }
}
