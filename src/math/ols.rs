//! Least squares solver.
//!
//! Every candidate model in the search is an intercept plus a handful of
//! predictor columns, so we repeatedly solve small problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Weighted problems (IRLS) are reduced to this form by the caller, which scales
//! rows by `sqrt(w_i)` before solving.
//!
//! We use SVD rather than normal equations: bootstrap resamples routinely
//! produce duplicated rows and constant columns, and the singular values give a
//! direct rank estimate so the fitter can reject rank-deficient designs instead
//! of silently returning a pseudo-inverse solution.

use nalgebra::{DMatrix, DVector};

/// Solution of a least squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub beta: DVector<f64>,
    /// Numerical rank of the design matrix.
    pub rank: usize,
}

/// Solve a least squares problem using SVD.
///
/// `rank_tol` is relative: singular values below `rank_tol * σ_max` count as zero.
///
/// Returns `None` if the decomposition fails or yields non-finite coefficients.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    rank_tol: f64,
) -> Option<LeastSquares> {
    if x.nrows() != y.len() || x.ncols() == 0 {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    if !sigma_max.is_finite() || sigma_max <= 0.0 {
        return None;
    }

    let cutoff = rank_tol.max(f64::EPSILON) * sigma_max;
    let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();

    let beta = svd.solve(y, cutoff).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(LeastSquares { beta, rank })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let ls = solve_least_squares(&x, &y, 1e-10).unwrap();
        assert_eq!(ls.rank, 2);
        assert!((ls.beta[0] - 2.0).abs() < 1e-10);
        assert!((ls.beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn duplicated_column_reports_reduced_rank() {
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 0.5, 0.5, //
                1.0, 1.5, 1.5, //
                1.0, 2.0, 2.0, //
                1.0, 3.5, 3.5,
            ],
        );
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);

        let ls = solve_least_squares(&x, &y, 1e-10).unwrap();
        assert_eq!(ls.rank, 2);
    }

    #[test]
    fn zero_matrix_is_rejected() {
        let x = DMatrix::<f64>::zeros(3, 2);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y, 1e-10).is_none());
    }
}
