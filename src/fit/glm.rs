//! Generalized linear model routines for the two supported families.
//!
//! - gaussian / identity: one SVD least squares solve.
//! - binomial / logit: iteratively reweighted least squares. Each iteration
//!   scales rows by `sqrt(w_i)` and solves an ordinary least squares problem
//!   for the working response `z = eta + (y - mu) / w`.
//!
//! AIC follows the usual GLM conventions:
//!
//! ```text
//! gaussian: n·ln(2π·RSS/n) + n + 2 + 2k      (k coefficients, +1 for σ²)
//! binomial: deviance + 2k                     (0/1 response)
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::FitFailure;
use crate::math::solve_least_squares;

/// Fitted probabilities closer than this to 0 or 1 indicate separation.
const SEPARATION_EPS: f64 = 10.0 * f64::EPSILON;

/// `|eta|` beyond which the inverse logit saturates.
const ETA_LIMIT: f64 = 30.0;

/// Raw output of a single GLM fit.
#[derive(Debug, Clone)]
pub struct GlmFit {
    pub coefficients: DVector<f64>,
    pub deviance: f64,
    pub aic: f64,
    pub iterations: usize,
}

/// IRLS controls.
#[derive(Debug, Clone, Copy)]
pub struct IrlsControl {
    pub max_iter: usize,
    /// Relative deviance change below which IRLS has converged.
    pub tolerance: f64,
    pub rank_tol: f64,
}

pub fn fit_gaussian(x: &DMatrix<f64>, y: &DVector<f64>, rank_tol: f64) -> Result<GlmFit, FitFailure> {
    let n = x.nrows();
    let k = x.ncols();
    if n <= k {
        return Err(FitFailure::NoResidualDf { n, k });
    }

    let ls = solve_least_squares(x, y, rank_tol).ok_or(FitFailure::NonFinite)?;
    if ls.rank < k {
        return Err(FitFailure::Singular { rank: ls.rank, cols: k });
    }

    let rss = (y - x * &ls.beta).norm_squared();
    if !rss.is_finite() {
        return Err(FitFailure::NonFinite);
    }
    if rss <= 0.0 {
        // Exact fit: the likelihood is unbounded.
        return Err(FitFailure::NoResidualDf { n, k });
    }

    let n_f = n as f64;
    let aic = n_f * (2.0 * std::f64::consts::PI * rss / n_f).ln() + n_f + 2.0 + 2.0 * k as f64;

    Ok(GlmFit {
        coefficients: ls.beta,
        deviance: rss,
        aic,
        iterations: 1,
    })
}

pub fn fit_logistic(x: &DMatrix<f64>, y: &DVector<f64>, control: IrlsControl) -> Result<GlmFit, FitFailure> {
    let n = x.nrows();
    let k = x.ncols();
    if n <= k {
        return Err(FitFailure::NoResidualDf { n, k });
    }

    let mut mu: DVector<f64> = y.map(|yi| (yi + 0.5) / 2.0);
    let mut eta: DVector<f64> = mu.map(|m| (m / (1.0 - m)).ln());
    let mut dev_old = binomial_deviance(y, &mu);
    let mut beta = DVector::zeros(k);

    let mut converged = false;
    let mut iterations = 0;
    while iterations < control.max_iter {
        iterations += 1;

        let mut xw = DMatrix::<f64>::zeros(n, k);
        let mut zw = DVector::<f64>::zeros(n);
        for i in 0..n {
            let w = mu[i] * (1.0 - mu[i]);
            let sw = w.sqrt();
            let z = eta[i] + (y[i] - mu[i]) / w;
            for j in 0..k {
                xw[(i, j)] = x[(i, j)] * sw;
            }
            zw[i] = z * sw;
        }

        let ls = solve_least_squares(&xw, &zw, control.rank_tol).ok_or(FitFailure::NonFinite)?;
        if ls.rank < k {
            return Err(FitFailure::Singular { rank: ls.rank, cols: k });
        }
        beta = ls.beta;

        eta = x * &beta;
        mu = eta.map(inverse_logit);
        let dev = binomial_deviance(y, &mu);
        if !dev.is_finite() {
            return Err(FitFailure::NonFinite);
        }

        if (dev - dev_old).abs() / (dev.abs() + 0.1) < control.tolerance {
            dev_old = dev;
            converged = true;
            break;
        }
        dev_old = dev;
    }

    if !converged {
        return Err(FitFailure::NotConverged { iterations });
    }
    if mu.iter().any(|&m| m < SEPARATION_EPS || m > 1.0 - SEPARATION_EPS) {
        return Err(FitFailure::Separation);
    }

    Ok(GlmFit {
        coefficients: beta,
        deviance: dev_old,
        aic: dev_old + 2.0 * k as f64,
        iterations,
    })
}

/// Inverse logit with the exponent saturated at `±ETA_LIMIT`.
pub fn inverse_logit(eta: f64) -> f64 {
    let t = if eta < -ETA_LIMIT {
        f64::EPSILON
    } else if eta > ETA_LIMIT {
        1.0 / f64::EPSILON
    } else {
        eta.exp()
    };
    t / (1.0 + t)
}

fn binomial_deviance(y: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    -2.0 * y
        .iter()
        .zip(mu.iter())
        .map(|(&yi, &m)| if yi > 0.5 { m.ln() } else { (1.0 - m).ln() })
        .sum::<f64>()
}
