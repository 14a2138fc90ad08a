//! Full forecasts with the real adapters

use chrono::NaiveDate;
use forecast_core::{Forecaster, HorizonConfig, ModelKind, PricePoint, PriceSeries, business_days_after};
use forecast_models::{ModelsConfig, adapters, default_adapters};

fn linear_trend(days: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let points = business_days_after(start, days)
        .into_iter()
        .enumerate()
        .map(|(i, date)| PricePoint::new(date, 100.0 + 0.5 * i as f64))
        .collect();
    PriceSeries::new("LINE", points).unwrap()
}

#[tokio::test]
async fn test_linear_trend_gives_monotone_ensemble() {
    let series = linear_trend(500);
    let forecaster = Forecaster::new(default_adapters().unwrap()).unwrap();

    let report = forecaster
        .forecast(&series, HorizonConfig::default())
        .await
        .unwrap();

    assert!(report.comparison.missing().is_empty(), "{:?}", report.comparison);
    assert_eq!(report.ensemble.models, ModelKind::ALL.to_vec());

    let values = report.ensemble.values();
    assert_eq!(values.len(), 30);
    assert!(
        values.windows(2).all(|w| w[1] > w[0]),
        "ensemble not increasing: {values:?}"
    );

    let last_close = series.last().unwrap().close;
    assert!(values[0] > last_close - 5.0);

    let first_date = report.ensemble.points[0].date;
    assert!(first_date > series.last().unwrap().date);
}

#[tokio::test]
async fn test_report_carries_statistical_bounds() {
    let series = linear_trend(400);
    let forecaster = Forecaster::new(default_adapters().unwrap()).unwrap();

    let report = forecaster
        .forecast(&series, HorizonConfig::new(60, 10).unwrap())
        .await
        .unwrap();

    let statistical = &report.forecasts[&ModelKind::Statistical];
    assert_eq!(statistical.intervals.as_ref().map(Vec::len), Some(10));
    assert!(report.forecasts[&ModelKind::Simulation].intervals.is_none());
    assert_eq!(
        report.validation[&ModelKind::Sequence].len(),
        report.forecast_table.history.len() - forecast_train_len(&report)
    );
}

fn forecast_train_len(report: &forecast_core::ForecastReport) -> usize {
    let first_validation = report.validation[&ModelKind::Statistical][0].date;
    report
        .forecast_table
        .history
        .iter()
        .filter(|p| p.date < first_validation)
        .count()
}

#[tokio::test]
async fn test_history_too_short_for_the_sequence_lookback() {
    // 80 weekdays: the 90-day validation window leaves nothing to train on
    let series = linear_trend(80);
    let forecaster = Forecaster::new(adapters(&ModelsConfig::default()).unwrap()).unwrap();

    let err = forecaster
        .forecast(&series, HorizonConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, forecast_core::ForecastError::InsufficientData { .. }));
}
