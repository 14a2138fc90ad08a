//! Terminal tables for forecast reports and lookup results

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use forecast_core::{ForecastReport, ModelKind, ModelStatus};
use forecast_stock::SymbolMatch;

fn table(header: Vec<Cell>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

/// Validation metrics per model, best MSE marked
pub fn comparison(report: &ForecastReport) -> Table {
    let best = report.comparison.best_by_mse();
    let mut out = table(vec![
        Cell::new("Model"),
        Cell::new("MSE"),
        Cell::new("sMAPE %"),
        Cell::new("Direction %"),
    ]);

    for (kind, status) in report.comparison.iter() {
        let name = if Some(*kind) == best {
            format!("{kind} *")
        } else {
            kind.to_string()
        };
        match status {
            ModelStatus::Completed { errors } => {
                out.add_row(vec![
                    Cell::new(name),
                    number(errors.mean_squared_error),
                    number(errors.scale_free_percent_error),
                    number(errors.directional_accuracy * 100.0),
                ]);
            }
            ModelStatus::Failed { reason } => {
                out.add_row(vec![
                    Cell::new(name),
                    Cell::new(format!("failed: {reason}")),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }
    out
}

/// One row per forecast date, one column per model plus the ensemble
pub fn forecast(report: &ForecastReport) -> Table {
    let kinds: Vec<ModelKind> = report.comparison.iter().map(|(kind, _)| *kind).collect();

    let mut header = vec![Cell::new("Date")];
    header.extend(kinds.iter().map(Cell::new));
    header.push(Cell::new("Ensemble"));
    let mut out = table(header);

    for (i, row) in report.forecast_table.rows.iter().enumerate() {
        let mut cells = vec![Cell::new(row.date)];
        for kind in &kinds {
            let cell = match row.predictions.get(kind).copied().flatten() {
                Some(value) => match bounds(report, *kind, i) {
                    Some((lower, upper)) => {
                        Cell::new(format!("{value:.2} [{lower:.2}, {upper:.2}]"))
                            .set_alignment(CellAlignment::Right)
                    }
                    None => number(value),
                },
                None => Cell::new("-"),
            };
            cells.push(cell);
        }
        cells.push(number(row.ensemble));
        out.add_row(cells);
    }
    out
}

fn bounds(report: &ForecastReport, kind: ModelKind, index: usize) -> Option<(f64, f64)> {
    let intervals = report.forecasts.get(&kind)?.intervals.as_ref()?;
    intervals.get(index).map(|b| (b.lower, b.upper))
}

pub fn matches(matches: &[SymbolMatch]) -> Table {
    let mut out = table(vec![
        Cell::new("Symbol"),
        Cell::new("Company"),
        Cell::new("Exchange"),
    ]);
    for m in matches {
        out.add_row(vec![
            Cell::new(&m.symbol),
            Cell::new(&m.company_name),
            Cell::new(&m.exchange),
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> ForecastReport {
        serde_json::from_value(json!({
            "id": "5f0c3c7e-9a4b-4c1e-8f0a-2b6d7e9c1a11",
            "symbol": "ACME",
            "generated_at": "2024-05-01T12:00:00Z",
            "horizon": { "validation_days": 90, "forecast_days": 2 },
            "comparison": {
                "statistical": {
                    "status": "completed",
                    "errors": {
                        "mean_squared_error": 1.5,
                        "scale_free_percent_error": 2.25,
                        "directional_accuracy": 0.5
                    }
                },
                "sequence": { "status": "failed", "reason": "training diverged" },
                "simulation": {
                    "status": "completed",
                    "errors": {
                        "mean_squared_error": 4.0,
                        "scale_free_percent_error": 3.0,
                        "directional_accuracy": 0.4
                    }
                }
            },
            "forecast_table": {
                "history": [{ "date": "2024-04-30", "close": 100.0 }],
                "rows": [
                    {
                        "date": "2024-05-01",
                        "predictions": { "statistical": 101.0, "sequence": null, "simulation": 103.0 },
                        "ensemble": 102.0
                    },
                    {
                        "date": "2024-05-02",
                        "predictions": { "statistical": 102.0, "sequence": null, "simulation": 104.0 },
                        "ensemble": 103.0
                    }
                ]
            },
            "ensemble": {
                "points": [
                    { "date": "2024-05-01", "value": 102.0 },
                    { "date": "2024-05-02", "value": 103.0 }
                ],
                "models": ["statistical", "simulation"]
            },
            "validation": {},
            "forecasts": {
                "statistical": {
                    "points": [
                        { "date": "2024-05-01", "value": 101.0 },
                        { "date": "2024-05-02", "value": 102.0 }
                    ],
                    "intervals": [
                        { "lower": 99.0, "upper": 103.0 },
                        { "lower": 98.5, "upper": 105.5 }
                    ]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_comparison_marks_best_and_failed() {
        let rendered = comparison(&report()).to_string();
        assert!(rendered.contains("statistical *"));
        assert!(rendered.contains("failed: training diverged"));
        assert!(rendered.contains("50.00"));
    }

    #[test]
    fn test_forecast_rows() {
        let table = forecast(&report());
        assert_eq!(table.row_iter().count(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("2024-05-02"));
        assert!(rendered.contains("101.00 [99.00, 103.00]"));
        assert!(rendered.contains("103.00"));
        assert!(rendered.contains("Ensemble"));
    }

    #[test]
    fn test_matches_table() {
        let rendered = matches(&[SymbolMatch {
            symbol: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            exchange: "NASDAQ".to_string(),
        }])
        .to_string();
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("Apple Inc."));
    }
}
