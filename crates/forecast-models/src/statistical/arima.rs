//! ARIMA(p, d, q) estimated by Hannan–Rissanen regression

use super::diff::{difference, integrate};
use crate::error::{ModelError, Result, ensure_finite};
use crate::linalg::least_squares;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Residual variance floor; keeps the likelihood finite on exact fits
const MIN_VARIANCE: f64 = 1e-12;

/// Upper bound on the long autoregression used to estimate innovations
const MAX_LONG_AR: usize = 12;

/// Model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Intercept plus AR and MA coefficients
    pub fn num_coefficients(&self) -> usize {
        1 + self.p + self.q
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Largest orders considered by the search
///
/// Also fixes the first regression row, so every candidate of one search
/// is scored on the same observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLimits {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
}

impl Default for OrderLimits {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 2,
        }
    }
}

impl OrderLimits {
    fn long_ar_order(&self, n: usize) -> usize {
        let floor = self.max_p.max(self.max_q) + 1;
        ((n as f64).sqrt() as usize).clamp(floor, MAX_LONG_AR.max(floor))
    }

    /// First differenced index used as a regression row
    fn first_row(&self, n: usize) -> usize {
        self.long_ar_order(n) + self.max_q
    }

    /// Shortest raw history a model of `order` can be fitted on
    pub fn min_observations(&self, order: ArimaOrder) -> usize {
        // first_row is monotone in n; solve with the largest long AR order
        let first_row = MAX_LONG_AR.max(self.max_p.max(self.max_q) + 1) + self.max_q;
        order.d + first_row + order.num_coefficients() + 2
    }
}

/// An estimated ARIMA model together with the history it was fitted on
#[derive(Debug, Clone)]
pub struct FittedArima {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    aic: f64,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

impl FittedArima {
    /// Estimate `order` on `history`
    ///
    /// A long autoregression supplies innovation estimates; the ARMA
    /// coefficients then come from one least squares regression on lagged
    /// values and lagged innovations.
    pub fn fit(history: &[f64], order: ArimaOrder, limits: &OrderLimits) -> Result<Self> {
        if order.p > limits.max_p || order.q > limits.max_q || order.d > limits.max_d {
            return Err(ModelError::InvalidConfig {
                name: "order",
                reason: format!("{order} exceeds the search limits"),
            });
        }

        let w = difference(history, order.d);
        let n = w.len();
        let start = limits.first_row(n);
        let k = order.num_coefficients();
        if n < start + k + 2 {
            return Err(ModelError::TooShort {
                needed: order.d + start + k + 2,
                got: history.len(),
            });
        }

        let innovations = if order.q > 0 {
            long_ar_innovations(&w, limits.long_ar_order(n))?
        } else {
            vec![0.0; n]
        };

        let (rows, targets): (Vec<Vec<f64>>, Vec<f64>) = (start..n)
            .map(|t| {
                let mut row = Vec::with_capacity(k);
                row.push(1.0);
                row.extend((1..=order.p).map(|i| w[t - i]));
                row.extend((1..=order.q).map(|j| innovations[t - j]));
                (row, w[t])
            })
            .unzip();
        let beta = least_squares(&rows, &targets)?;

        let mut model = Self {
            order,
            intercept: beta[0],
            ar: beta[1..=order.p].to_vec(),
            ma: beta[1 + order.p..].to_vec(),
            sigma2: MIN_VARIANCE,
            aic: f64::INFINITY,
            history: history.to_vec(),
            differenced: w,
            residuals: Vec::new(),
        };
        model.compute_residuals(start)?;
        Ok(model)
    }

    fn compute_residuals(&mut self, start: usize) -> Result<()> {
        let n = self.differenced.len();
        let mut residuals = vec![0.0; n];
        for t in self.order.p.max(self.order.q)..n {
            let predicted = self.predict_at(t, &self.differenced, &residuals);
            residuals[t] = ensure_finite(self.differenced[t] - predicted, "residual recursion")?;
        }

        let scored = &residuals[start..];
        let n_eff = scored.len() as f64;
        let sigma2 = (scored.iter().map(|r| r * r).sum::<f64>() / n_eff).max(MIN_VARIANCE);
        // variance counts as a parameter
        let params = (self.order.num_coefficients() + 1) as f64;

        self.sigma2 = sigma2;
        self.aic = ensure_finite(n_eff * sigma2.ln() + 2.0 * params, "information criterion")?;
        self.residuals = residuals;
        Ok(())
    }

    /// One-step prediction of `w[t]` from everything before `t`
    fn predict_at(&self, t: usize, w: &[f64], residuals: &[f64]) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .enumerate()
            .filter(|(i, _)| t > *i)
            .map(|(i, phi)| phi * w[t - 1 - i])
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .enumerate()
            .filter(|(j, _)| t > *j)
            .map(|(j, theta)| theta * residuals[t - 1 - j])
            .sum();
        self.intercept + ar + ma
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Point forecasts for the next `horizon` values on the original scale
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut w = self.differenced.clone();
        let mut residuals = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let next = self.predict_at(t, &w, &residuals);
            w.push(ensure_finite(next, "forecast recursion")?);
            residuals.push(0.0);
        }

        let ahead = &w[self.differenced.len()..];
        Ok(integrate(ahead, &self.history, self.order.d))
    }

    pub fn one_step(&self) -> Result<f64> {
        self.forecast(1)?
            .first()
            .copied()
            .ok_or(ModelError::NonFinite("one-step forecast"))
    }

    /// Two-sided prediction bounds at `level` around [`Self::forecast`]
    pub fn forecast_with_intervals(
        &self,
        horizon: usize,
        level: f64,
    ) -> Result<(Vec<f64>, Vec<(f64, f64)>)> {
        if level.is_nan() || level <= 0.0 || level >= 1.0 {
            return Err(ModelError::InvalidConfig {
                name: "confidence level",
                reason: format!("{level} is not in (0, 1)"),
            });
        }
        let normal = Normal::new(0.0, 1.0).map_err(|e| ModelError::InvalidConfig {
            name: "normal quantile",
            reason: e.to_string(),
        })?;
        let z = normal.inverse_cdf(0.5 + level / 2.0);

        let points = self.forecast(horizon)?;
        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let bounds = points
            .iter()
            .zip(&psi)
            .map(|(&point, &weight)| {
                cumulative += weight * weight;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (point - half_width, point + half_width)
            })
            .collect();

        Ok((points, bounds))
    }

    /// MA(∞) weights of the integrated process
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        // (1 - φ₁B - ... - φₚBᵖ)(1 - B)ᵈ
        let mut poly = Vec::with_capacity(self.ar.len() + 1);
        poly.push(1.0);
        poly.extend(self.ar.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }
        let phi_star: Vec<f64> = poly.iter().skip(1).map(|c| -c).collect();

        let mut psi = Vec::with_capacity(count);
        for j in 0..count {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = self.ma.get(j - 1).copied().unwrap_or_default();
            for i in 1..=j.min(phi_star.len()) {
                value += phi_star[i - 1] * psi[j - i];
            }
            psi.push(value);
        }
        psi
    }
}

/// Residuals of a long autoregression, zero where it has no lags
fn long_ar_innovations(w: &[f64], order: usize) -> Result<Vec<f64>> {
    let n = w.len();
    let (rows, targets): (Vec<Vec<f64>>, Vec<f64>) = (order..n)
        .map(|t| {
            let mut row = Vec::with_capacity(order + 1);
            row.push(1.0);
            row.extend((1..=order).map(|i| w[t - i]));
            (row, w[t])
        })
        .unzip();
    let beta = least_squares(&rows, &targets)?;

    let mut innovations = vec![0.0; n];
    for (offset, (row, target)) in rows.iter().zip(&targets).enumerate() {
        let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
        innovations[order + offset] = target - fitted;
    }
    Ok(innovations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = vec![0.0];
        for _ in 1..n {
            let shock: f64 = rng.gen_range(-1.0..1.0);
            let last = values[values.len() - 1];
            values.push(phi * last + shock);
        }
        values
    }

    #[test]
    fn test_recovers_ar_coefficient() {
        let series = ar1(2000, 0.7, 7);
        let model = FittedArima::fit(&series, ArimaOrder::new(1, 0, 0), &OrderLimits::default())
            .unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.7, epsilon = 0.05);
        assert!(model.aic().is_finite());
    }

    #[test]
    fn test_linear_trend_continues() {
        let series: Vec<f64> = (0..200).map(|i| 50.0 + 0.5 * f64::from(i)).collect();
        let model = FittedArima::fit(&series, ArimaOrder::new(0, 1, 0), &OrderLimits::default())
            .unwrap();

        let forecast = model.forecast(3).unwrap();
        assert_relative_eq!(forecast[0], 150.0, epsilon = 1e-4);
        assert_relative_eq!(forecast[2], 151.0, epsilon = 1e-4);
        assert_relative_eq!(model.sigma2(), MIN_VARIANCE);
    }

    #[test]
    fn test_intervals_widen_with_horizon() {
        let mut level = 100.0;
        let series: Vec<f64> = ar1(400, 0.3, 11)
            .into_iter()
            .map(|shock| {
                level += shock;
                level
            })
            .collect();
        let model = FittedArima::fit(&series, ArimaOrder::new(1, 1, 1), &OrderLimits::default())
            .unwrap();

        let (points, bounds) = model.forecast_with_intervals(10, 0.95).unwrap();
        assert_eq!(points.len(), 10);
        for ((lower, upper), point) in bounds.iter().zip(&points) {
            assert!(lower < point && point < upper);
        }
        let width = |i: usize| bounds[i].1 - bounds[i].0;
        assert!(width(9) > width(0));
    }

    #[test]
    fn test_psi_weights_of_random_walk() {
        let series: Vec<f64> = ar1(300, 1.0, 3);
        let model = FittedArima::fit(&series, ArimaOrder::new(0, 1, 0), &OrderLimits::default())
            .unwrap();
        assert_eq!(model.psi_weights(4), vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_too_short() {
        let err = FittedArima::fit(&[1.0, 2.0, 3.0], ArimaOrder::new(1, 1, 0), &OrderLimits::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::TooShort { .. }));
    }

    #[test]
    fn test_order_outside_limits() {
        let series = ar1(200, 0.5, 1);
        let err = FittedArima::fit(&series, ArimaOrder::new(5, 0, 0), &OrderLimits::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig { .. }));
    }
}
