//! Train / validation / forecast windowing

use crate::config::HorizonConfig;
use crate::error::{ForecastError, Result};
use crate::series::{PricePoint, PriceSeries};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// History older than this (relative to the last observation) is dropped
pub const LOOKBACK_MONTHS: u32 = 36;

/// Scoring a validation replay needs at least two points
pub const MIN_VALIDATION_POINTS: usize = 2;

/// The three windows derived from one history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSet {
    /// `[first_day, last_train_day]`
    pub train: Vec<PricePoint>,
    /// `(last_train_day, last_day]`, immediately follows `train`
    pub validation: Vec<PricePoint>,
    /// Weekdays after the last observation, one per forecast step
    pub forecast_dates: Vec<NaiveDate>,
}

impl WindowSet {
    pub fn train_closes(&self) -> Vec<f64> {
        self.train.iter().map(|p| p.close).collect()
    }

    pub fn validation_closes(&self) -> Vec<f64> {
        self.validation.iter().map(|p| p.close).collect()
    }

    /// Train followed by validation closes
    pub fn history_closes(&self) -> Vec<f64> {
        self.train
            .iter()
            .chain(&self.validation)
            .map(|p| p.close)
            .collect()
    }

    /// Train followed by validation points
    pub fn history(&self) -> Vec<PricePoint> {
        self.train.iter().chain(&self.validation).copied().collect()
    }

    pub fn validation_dates(&self) -> Vec<NaiveDate> {
        self.validation.iter().map(|p| p.date).collect()
    }

    pub fn horizon(&self) -> usize {
        self.forecast_dates.len()
    }
}

/// Partition `series` into train, validation and forecast windows
///
/// `validation_days` is measured in calendar days back from the last
/// observation; `forecast_days` counts weekdays forward from the day after it.
/// `min_train_len` is the largest training minimum any adapter requires.
pub fn compute_windows(
    series: &PriceSeries,
    validation_days: u32,
    forecast_days: u32,
    min_train_len: usize,
) -> Result<WindowSet> {
    HorizonConfig::new(validation_days, forecast_days)?;

    let last_day = series
        .last()
        .ok_or_else(|| ForecastError::NoData {
            symbol: series.symbol().to_string(),
        })?
        .date;

    let first_day = last_day
        .checked_sub_months(Months::new(LOOKBACK_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    let last_train_day = last_day
        .checked_sub_days(Days::new(u64::from(validation_days)))
        .ok_or_else(|| {
            ForecastError::invalid_parameter("validation_days", "reaches before the calendar start")
        })?;

    let train = if last_train_day < first_day {
        &[][..]
    } else {
        series.between(first_day, last_train_day)
    };
    let validation = series
        .between(last_train_day, last_day)
        .iter()
        .filter(|p| p.date > last_train_day)
        .copied()
        .collect::<Vec<_>>();

    let required_train = min_train_len.max(1);
    if train.len() < required_train {
        return Err(ForecastError::InsufficientData {
            window: "training".to_string(),
            required: required_train,
            actual: train.len(),
        });
    }
    if validation.len() < MIN_VALIDATION_POINTS {
        return Err(ForecastError::InsufficientData {
            window: "validation".to_string(),
            required: MIN_VALIDATION_POINTS,
            actual: validation.len(),
        });
    }

    let expected = forecast_days as usize;
    let forecast_dates = business_days_after(last_day, expected);
    if forecast_dates.len() != expected {
        return Err(ForecastError::CalendarDefect {
            expected,
            got: forecast_dates.len(),
        });
    }

    Ok(WindowSet {
        train: train.to_vec(),
        validation,
        forecast_dates,
    })
}

/// The first `count` weekdays strictly after `last_day`
///
/// Weekends are the only non-trading days known to this calendar; exchange
/// holidays are not excluded.
pub fn business_days_after(last_day: NaiveDate, count: usize) -> Vec<NaiveDate> {
    std::iter::successors(last_day.succ_opt(), NaiveDate::succ_opt)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}
