//! Differencing and its inverse

use crate::linalg::mean_variance;

/// Apply `d` rounds of first differencing
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values that continue `history`
pub fn integrate(differenced: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    let mut tails = Vec::with_capacity(d);
    let mut level = history.to_vec();
    for _ in 0..d {
        tails.push(level.last().copied().unwrap_or_default());
        level = difference(&level, 1);
    }

    let mut out = differenced.to_vec();
    for &tail in tails.iter().rev() {
        let mut acc = tail;
        for value in &mut out {
            acc += *value;
            *value = acc;
        }
    }
    out
}

/// Pick the differencing order by variance reduction
///
/// Differencing continues while it strictly lowers the variance, up to
/// `max_d`. A series whose variance is already negligible against its
/// magnitude is treated as stationary.
pub fn choose_order(series: &[f64], max_d: usize) -> usize {
    let scale = series.iter().map(|v| v * v).sum::<f64>() / series.len().max(1) as f64;
    let floor = scale * 1e-12;

    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d {
        let (_, var_current) = mean_variance(&current);
        if var_current <= floor {
            break;
        }
        let next = difference(&current, 1);
        if next.len() < 3 {
            break;
        }
        let (_, var_next) = mean_variance(&next);
        if var_next >= var_current {
            break;
        }
        current = next;
        d += 1;
    }
    d
}
