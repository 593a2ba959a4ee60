//! Synthetic regression samples for the CLI.
//!
//! Predictors `x1..xp` are independent standard normals. The linear predictor is
//! `eta = intercept + Σ β_j x_j` over the configured signal terms; the response
//! is `eta + noise` (gaussian) or a Bernoulli draw with `P(y=1) = logistic(eta)`
//! (binomial). Generation is fully determined by the seed.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::Dataset;
use crate::domain::{Family, SampleConfig};
use crate::error::{Result, SelectError};

/// Predictor names `x1..xp`.
pub fn predictor_names(p: usize) -> Vec<String> {
    (1..=p).map(|j| format!("x{j}")).collect()
}

pub fn generate_sample(config: &SampleConfig) -> Result<Dataset> {
    if config.n == 0 {
        return Err(SelectError::invalid("Sample size must be > 0."));
    }
    if config.p == 0 {
        return Err(SelectError::invalid("Predictor count must be > 0."));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(SelectError::invalid("Noise standard deviation must be finite and >= 0."));
    }
    if !config.intercept.is_finite() {
        return Err(SelectError::invalid("Intercept must be finite."));
    }

    let names = predictor_names(config.p);
    let mut beta = vec![0.0; config.p];
    for (name, coef) in &config.signal {
        let Some(j) = names.iter().position(|n| n == name) else {
            return Err(SelectError::invalid(format!(
                "Signal term '{name}' is not one of x1..x{}.",
                config.p
            )));
        };
        if !coef.is_finite() {
            return Err(SelectError::invalid(format!("Non-finite coefficient for '{name}'.")));
        }
        beta[j] = *coef;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| SelectError::invalid(format!("Noise distribution error: {e}")))?;

    let x = DMatrix::from_fn(config.n, config.p, |_, _| normal.sample(&mut rng));

    let mut y = DVector::zeros(config.n);
    for i in 0..config.n {
        let eta = config.intercept
            + (0..config.p).map(|j| beta[j] * x[(i, j)]).sum::<f64>();
        y[i] = match config.family {
            Family::Gaussian => eta + config.noise_sd * normal.sample(&mut rng),
            Family::Binomial => {
                let prob = 1.0 / (1.0 + (-eta).exp());
                if rng.gen_bool(prob) { 1.0 } else { 0.0 }
            }
        };
    }

    Dataset::new(names, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.names(), &predictor_names(5)[..]);
    }

    #[test]
    fn binomial_sample_is_binary() {
        let config = SampleConfig {
            family: Family::Binomial,
            n: 100,
            ..SampleConfig::default()
        };
        let data = generate_sample(&config).unwrap();
        assert!(data.validate_response(Family::Binomial).is_ok());
    }

    #[test]
    fn unknown_signal_term_is_rejected() {
        let config = SampleConfig {
            signal: vec![("x9".into(), 1.0)],
            ..SampleConfig::default()
        };
        assert!(matches!(
            generate_sample(&config),
            Err(SelectError::InvalidInput(_))
        ));
    }
}
