//! Order search by information criterion

use super::arima::{ArimaOrder, FittedArima, OrderLimits};
use super::diff::choose_order;
use crate::error::{ModelError, Result};
use tracing::debug;

/// Fit every `(p, q)` within `limits` at the chosen `d` and keep the lowest AIC
pub fn auto_arima(history: &[f64], limits: &OrderLimits) -> Result<FittedArima> {
    let d = choose_order(history, limits.max_d);
    let mut best: Option<FittedArima> = None;
    let mut last_error = None;

    for p in 0..=limits.max_p {
        for q in 0..=limits.max_q {
            let order = ArimaOrder::new(p, d, q);
            match FittedArima::fit(history, order, limits) {
                Ok(model) => {
                    debug!(%order, aic = model.aic(), "Candidate fitted");
                    if best.as_ref().is_none_or(|b| model.aic() < b.aic()) {
                        best = Some(model);
                    }
                }
                Err(err) => {
                    debug!(%order, error = %err, "Candidate rejected");
                    last_error = Some(err);
                }
            }
        }
    }

    best.ok_or_else(|| {
        ModelError::NotConverged(
            last_error.map_or_else(|| "empty search grid".to_string(), |e| e.to_string()),
        )
    })
}
