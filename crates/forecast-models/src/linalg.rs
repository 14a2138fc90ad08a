//! Dense least squares for the small systems the models solve

use crate::error::{ModelError, Result};

/// Ridge term added to the normal-equation diagonal
const RIDGE: f64 = 1e-8;

/// Least squares fit of `y ≈ X β` where `rows` holds the rows of `X`
///
/// Builds `X'X` and `X'y`, adds a tiny ridge and solves by Cholesky.
pub fn least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    let Some(first) = rows.first() else {
        return Err(ModelError::TooShort { needed: 1, got: 0 });
    };
    let k = first.len();
    if rows.len() != y.len() || rows.iter().any(|r| r.len() != k) {
        return Err(ModelError::InvalidConfig {
            name: "design matrix",
            reason: "ragged rows or target length mismatch".to_string(),
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += RIDGE;
    }

    solve_symmetric(&xtx, &xty).ok_or(ModelError::Singular)
}

/// Solve `A x = b` for symmetric positive definite `A`
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Population mean and variance
pub fn mean_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_line() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![1.0, f64::from(i)]).collect();
        let y: Vec<f64> = (0..20).map(|i| 3.0 + 0.5 * f64::from(i)).collect();

        let beta = least_squares(&rows, &y).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(beta[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_collinear_columns_stay_solvable() {
        // second column duplicates the intercept
        let rows: Vec<Vec<f64>> = (0..10).map(|_| vec![1.0, 1.0]).collect();
        let y = vec![2.0; 10];

        let beta = least_squares(&rows, &y).unwrap();
        assert_relative_eq!(beta[0] + beta[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_ragged_input() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(least_squares(&rows, &[1.0, 2.0]).is_err());
        assert_eq!(
            least_squares(&[], &[]).unwrap_err(),
            ModelError::TooShort { needed: 1, got: 0 }
        );
    }

    #[test]
    fn test_not_positive_definite() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert!(solve_symmetric(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_mean_variance() {
        let (mean, variance) = mean_variance(&[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(mean, 2.5);
        assert_relative_eq!(variance, 1.25);
    }
}
