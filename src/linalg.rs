//! Small dense least-squares solvers for the estimators. Designs are stored
//! row-major as `Vec<Vec<f64>>`; problem sizes stay in the tens of columns.

use crate::errors::{ForecastError, Result};

/// Added to the diagonal of unpenalized columns to keep the system invertible.
const MIN_RIDGE: f64 = 1e-10;
const PIVOT_TOLERANCE: f64 = 1e-13;
const IRLS_EPSILON: f64 = 1e-8;
const IRLS_MAX_ITERATIONS: usize = 200;
const IRLS_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Penalty {
    None,
    /// Squared-magnitude penalty `λ/2 · β²` (Gaussian prior).
    Ridge(f64),
    /// Absolute-magnitude penalty `λ · |β|` (Laplace prior).
    Lasso(f64),
}

/// Minimizes `½‖y − Xβ‖² + Σ penalty_j(β_j)`.
///
/// Ridge and unpenalized columns are solved in closed form. Lasso columns use
/// iteratively reweighted least squares started from the matching ridge solution.
pub fn penalized_least_squares(
    design: &[Vec<f64>],
    target: &[f64],
    penalties: &[Penalty],
) -> Result<Vec<f64>> {
    let columns = penalties.len();
    if design.len() != target.len() || design.iter().any(|row| row.len() != columns) {
        return Err(ForecastError::fit("design matrix shape does not match target"));
    }
    if columns == 0 {
        return Ok(Vec::new());
    }

    let (xtx, xty) = normal_equations(design, target, columns);

    let initial: Vec<f64> = penalties
        .iter()
        .map(|penalty| match *penalty {
            Penalty::None => MIN_RIDGE,
            Penalty::Ridge(lambda) | Penalty::Lasso(lambda) => lambda.max(MIN_RIDGE),
        })
        .collect();
    let mut beta = solve(with_diagonal(&xtx, &initial), xty.clone())?;

    if !penalties.iter().any(|p| matches!(p, Penalty::Lasso(_))) {
        return Ok(beta);
    }

    for _ in 0..IRLS_MAX_ITERATIONS {
        let weights: Vec<f64> = penalties
            .iter()
            .zip(&beta)
            .map(|(penalty, coef)| match *penalty {
                Penalty::None => MIN_RIDGE,
                Penalty::Ridge(lambda) => lambda.max(MIN_RIDGE),
                Penalty::Lasso(lambda) => (lambda / coef.abs().max(IRLS_EPSILON)).max(MIN_RIDGE),
            })
            .collect();
        let next = solve(with_diagonal(&xtx, &weights), xty.clone())?;
        let change = next
            .iter()
            .zip(&beta)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        beta = next;
        if change < IRLS_TOLERANCE {
            break;
        }
    }

    Ok(beta)
}

/// Returns `XᵀX` and `Xᵀy`.
pub fn normal_equations(
    design: &[Vec<f64>],
    target: &[f64],
    columns: usize,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut xtx = vec![vec![0.0; columns]; columns];
    let mut xty = vec![0.0; columns];
    for (row, &y) in design.iter().zip(target) {
        for a in 0..columns {
            let xa = row[a];
            if xa == 0.0 {
                continue;
            }
            xty[a] += xa * y;
            for b in a..columns {
                xtx[a][b] += xa * row[b];
            }
        }
    }
    for a in 0..columns {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
    }
    (xtx, xty)
}

/// Solves `A x = b` by Gaussian elimination with partial pivoting.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= PIVOT_TOLERANCE * scale {
            return Err(ForecastError::fit(format!(
                "singular regression system (column {col} of {n})"
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|value| value.is_finite()) {
        Ok(x)
    } else {
        Err(ForecastError::fit("regression produced non-finite coefficients"))
    }
}

fn with_diagonal(matrix: &[Vec<f64>], diagonal: &[f64]) -> Vec<Vec<f64>> {
    let mut out = matrix.to_vec();
    for (i, extra) in diagonal.iter().enumerate() {
        out[i][i] += extra;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn singular_system_is_a_fit_error() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let err = solve(a, vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), "fit");
    }

    #[test]
    fn unpenalized_fit_recovers_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let target: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let beta =
            penalized_least_squares(&design, &target, &[Penalty::None, Penalty::None]).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-6);
        assert!((beta[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn lasso_drops_irrelevant_column() {
        let design: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let t = i as f64 / 19.0;
                vec![1.0, t, (t - 0.5).max(0.0)]
            })
            .collect();
        let target: Vec<f64> = (0..20)
            .map(|i| 1.0 + 0.5 * (i as f64 / 19.0) + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let penalties = [Penalty::None, Penalty::None, Penalty::Lasso(0.1)];
        let beta = penalized_least_squares(&design, &target, &penalties).unwrap();
        assert!(beta[2].abs() < 1e-4, "hinge coefficient {}", beta[2]);
        assert!((beta[1] - 0.5).abs() < 0.05);
    }

    #[test]
    fn ridge_shrinks_towards_zero() {
        let design: Vec<Vec<f64>> = (0..4).map(|_| vec![1.0]).collect();
        let target = vec![2.0; 4];
        let beta = penalized_least_squares(&design, &target, &[Penalty::Ridge(4.0)]).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let design = vec![vec![1.0, 2.0]];
        assert!(penalized_least_squares(&design, &[1.0], &[Penalty::None]).is_err());
    }
}
