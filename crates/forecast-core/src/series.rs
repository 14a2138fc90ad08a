//! Daily closing-price series

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observed trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered closing prices for one symbol
///
/// Dates are strictly increasing and every price is finite; the constructor
/// enforces both. The series is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a validated series
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.close.is_finite()) {
            return Err(ForecastError::InvalidSeries(format!(
                "non-finite price {} on {}",
                bad.close, bad.date
            )));
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ForecastError::InvalidSeries(format!(
                "dates must be strictly increasing, {} follows {}",
                pair[1].date, pair[0].date
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// A series with no observations
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing prices in chronological order
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Points with `start <= date <= end`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[PricePoint] {
        let from = self.points.partition_point(|p| p.date < start);
        let to = self.points.partition_point(|p| p.date <= end);
        if from >= to {
            &[]
        } else {
            &self.points[from..to]
        }
    }
}
