//! The model fitting contract used by the search, and its default implementation.
//!
//! The search only needs one thing from a fitter: an AIC for "intercept plus
//! these columns" on a given dataset, or a [`FitFailure`] when the fit is not
//! usable. Anything implementing [`ModelFitter`] can be plugged in; [`GlmFitter`]
//! covers gaussian (OLS) and binomial (logit IRLS) responses.
//!
//! Fitters must be `Send + Sync`: stability resamples share one fitter across
//! worker threads.

use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::domain::Family;
use crate::error::{FitFailure, Result, SelectError};
use crate::fit::glm::{IrlsControl, fit_gaussian, fit_logistic, inverse_logit};

pub trait ModelFitter: Send + Sync {
    /// Fit intercept plus `columns` of `data`.
    fn fit(&self, data: &Dataset, columns: &[usize], family: Family) -> std::result::Result<FittedModel, FitFailure>;

    /// AIC of intercept plus `columns`. Override when the AIC is cheaper than a full fit.
    fn aic(&self, data: &Dataset, columns: &[usize], family: Family) -> std::result::Result<f64, FitFailure> {
        self.fit(data, columns, family).map(|f| f.aic)
    }
}

/// A fitted regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub family: Family,
    /// Predictor names in coefficient order (after the intercept).
    pub terms: Vec<String>,
    /// Intercept first, then one coefficient per term.
    pub coefficients: Vec<f64>,
    /// Residual sum of squares (gaussian) or binomial deviance.
    pub deviance: f64,
    pub aic: f64,
    pub iterations: usize,
}

impl FittedModel {
    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.terms
            .iter()
            .position(|t| t == name)
            .map(|i| self.coefficients[i + 1])
    }

    /// Fitted mean for each row of `data`: the linear predictor for gaussian
    /// models, `P(y = 1)` for binomial models.
    ///
    /// Terms are looked up by name, so `data` may order its columns differently
    /// from the training data, but it must contain every term.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        let mut columns = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            let Some(j) = data.column_index(term) else {
                return Err(SelectError::invalid(format!(
                    "Prediction data has no column '{term}'."
                )));
            };
            columns.push(j);
        }

        let x = data.x();
        let out = (0..data.n())
            .map(|i| {
                let eta = self.coefficients[0]
                    + columns
                        .iter()
                        .enumerate()
                        .map(|(t, &j)| self.coefficients[t + 1] * x[(i, j)])
                        .sum::<f64>();
                match self.family {
                    Family::Gaussian => eta,
                    Family::Binomial => inverse_logit(eta),
                }
            })
            .collect();
        Ok(out)
    }
}

/// Default fitter: OLS for gaussian, logit IRLS for binomial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlmFitter {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Relative singular value cutoff for rank detection.
    pub rank_tol: f64,
}

impl Default for GlmFitter {
    fn default() -> Self {
        Self {
            max_iter: 25,
            tolerance: 1e-8,
            rank_tol: 1e-10,
        }
    }
}

impl ModelFitter for GlmFitter {
    fn fit(&self, data: &Dataset, columns: &[usize], family: Family) -> std::result::Result<FittedModel, FitFailure> {
        let design = data.design(columns);
        let glm = match family {
            Family::Gaussian => fit_gaussian(&design, data.y(), self.rank_tol)?,
            Family::Binomial => fit_logistic(
                &design,
                data.y(),
                IrlsControl {
                    max_iter: self.max_iter,
                    tolerance: self.tolerance,
                    rank_tol: self.rank_tol,
                },
            )?,
        };

        if !glm.aic.is_finite() {
            return Err(FitFailure::NonFinite);
        }

        Ok(FittedModel {
            family,
            terms: columns.iter().map(|&c| data.names()[c].clone()).collect(),
            coefficients: glm.coefficients.iter().copied().collect(),
            deviance: glm.deviance,
            aic: glm.aic,
            iterations: glm.iterations,
        })
    }
}
