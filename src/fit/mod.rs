//! Regression fitting behind the `ModelFitter` contract.
//!
//! Responsibilities:
//!
//! - define what the search needs from a fitter (an AIC or a `FitFailure`)
//! - provide the default GLM fitter (gaussian OLS, binomial IRLS)
//! - carry fitted coefficients for refits and predictions

pub mod fitter;
pub mod glm;

pub use fitter::*;

#[cfg(test)]
pub(crate) mod testing;
