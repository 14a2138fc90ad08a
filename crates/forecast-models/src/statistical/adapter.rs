use super::arima::{ArimaOrder, FittedArima, OrderLimits};
use super::auto::auto_arima;
use crate::error::ModelError;
use forecast_core::{
    AdapterOutput, ModelAdapter, ModelKind, OneStepModel, Result, WindowSet, walk_forward,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const KIND: ModelKind = ModelKind::Statistical;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalConfig {
    pub limits: OrderLimits,
    /// Coverage of the forecast bounds
    pub confidence_level: f64,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            limits: OrderLimits::default(),
            confidence_level: 0.95,
        }
    }
}

/// Auto ARIMA behind the adapter contract
///
/// The order is chosen once on the training window. Validation refits that
/// order after every revealed point; the forecast comes from a final refit
/// on train plus validation.
#[derive(Debug, Clone, Default)]
pub struct StatisticalAdapter {
    config: StatisticalConfig,
}

impl StatisticalAdapter {
    pub fn new(config: StatisticalConfig) -> Self {
        Self { config }
    }
}

impl ModelAdapter for StatisticalAdapter {
    fn kind(&self) -> ModelKind {
        KIND
    }

    fn min_training_len(&self) -> usize {
        let limits = self.config.limits;
        limits.min_observations(ArimaOrder::new(limits.max_p, limits.max_d, limits.max_q))
    }

    fn run(&self, window: &WindowSet) -> Result<AdapterOutput> {
        let limits = self.config.limits;
        let selected = auto_arima(&window.train_closes(), &limits).map_err(into_error)?;
        let order = selected.order();
        debug!(%order, aic = selected.aic(), "Order selected on training window");

        let mut stepper = RefittingStepper {
            limits,
            history: selected.history().to_vec(),
            model: selected,
        };
        let predicted = walk_forward(&mut stepper, &window.validation_closes())?;

        let final_model =
            FittedArima::fit(&window.history_closes(), order, &limits).map_err(into_error)?;
        let (points, bounds) = final_model
            .forecast_with_intervals(window.horizon(), self.config.confidence_level)
            .map_err(into_error)?;

        Ok(AdapterOutput::assemble(KIND, window, predicted, &points)?.with_intervals(&bounds))
    }
}

/// One-step predictions, refitting the selected order on each new point
struct RefittingStepper {
    limits: OrderLimits,
    history: Vec<f64>,
    model: FittedArima,
}

impl OneStepModel for RefittingStepper {
    fn predict_next(&mut self) -> Result<f64> {
        self.model.one_step().map_err(into_error)
    }

    fn observe(&mut self, actual: f64) -> Result<()> {
        self.history.push(actual);
        self.model =
            FittedArima::fit(&self.history, self.model.order(), &self.limits).map_err(into_error)?;
        Ok(())
    }
}

fn into_error(err: ModelError) -> forecast_core::ForecastError {
    err.into_forecast_error(KIND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use forecast_core::{PricePoint, PriceSeries, business_days_after, compute_windows};

    fn trend_window() -> WindowSet {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let dates = business_days_after(start, 300);
        let points = dates
            .iter()
            .enumerate()
            .map(|(i, d)| PricePoint::new(*d, 40.0 + i as f64))
            .collect();
        let series = PriceSeries::new("TRND", points).unwrap();
        compute_windows(&series, 60, 10, 30).unwrap()
    }

    #[test]
    fn test_trend_is_extrapolated_with_bounds() {
        let window = trend_window();
        let output = StatisticalAdapter::default().run(&window).unwrap();

        let last = window.history_closes().last().copied().unwrap();
        let values = output.forecast.values();
        assert_relative_eq!(values[0], last + 1.0, epsilon = 1e-3);
        assert!(values.windows(2).all(|w| w[1] > w[0]));

        let intervals = output.forecast.intervals.unwrap();
        assert_eq!(intervals.len(), 10);

        // one-step replay of an exact line is exact
        assert!(output.validation.errors.mean_squared_error < 1e-6);
        assert_relative_eq!(output.validation.errors.directional_accuracy, 1.0);
    }

    #[test]
    fn test_short_training_window_is_adapter_failure() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let window = WindowSet {
            train: vec![PricePoint::new(start, 1.0), PricePoint::new(start.succ_opt().unwrap(), 2.0)],
            validation: business_days_after(start, 5)
                .into_iter()
                .enumerate()
                .map(|(i, d)| PricePoint::new(d + chrono::Days::new(7), 3.0 + i as f64))
                .collect(),
            forecast_dates: business_days_after(start + chrono::Days::new(30), 3),
        };

        let err = StatisticalAdapter::default().run(&window).unwrap_err();
        assert!(matches!(
            err,
            forecast_core::ForecastError::Adapter(ref e) if e.model == ModelKind::Statistical
        ));
    }
}
