//! Run configuration.
//!
//! Each component takes its own parameter struct; `RunConfig` bundles them for
//! the CLI pipeline. Defaults follow the conventional settings of the method:
//! `eps = 1e-6`, `delta = 1`, `L = 50`, `B = 50`, `Δ = 2`, `τ = 0.6`,
//! Jaccard threshold `0.9`.

use serde::{Deserialize, Serialize};

use crate::domain::{Family, ResampleKind};

/// Depth cap used when `max_depth` is not given: `min(p, DEFAULT_MAX_DEPTH)`.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Parameters of the multi-path forward search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum depth `K`. `None` means `min(p, 10)`; values above `p` are clamped.
    pub max_depth: Option<usize>,
    /// Minimum AIC improvement of a parent's best child for the parent to expand.
    pub eps: f64,
    /// AIC window around a parent's best child for keeping near-ties.
    pub delta: f64,
    /// Maximum number of models retained per depth (`L`).
    pub max_models: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            eps: 1e-6,
            delta: 1.0,
            max_models: 50,
        }
    }
}

/// Parameters of the resampling stability estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityParams {
    /// Number of resamples `B`.
    pub resamples: usize,
    pub kind: ResampleKind,
    /// Subsample size `m`; `None` means `ceil(sqrt(n))`. Ignored for bootstrap.
    pub subsample_size: Option<usize>,
    /// Base seed. Resample `b` draws from a generator seeded by `(seed, b)`.
    pub seed: u64,
    /// Worker threads; `None` uses rayon's global pool.
    pub workers: Option<usize>,
    /// Search parameters forwarded to every resample.
    pub search: SearchParams,
}

impl Default for StabilityParams {
    fn default() -> Self {
        Self {
            resamples: 50,
            kind: ResampleKind::Bootstrap,
            subsample_size: None,
            seed: 42,
            workers: None,
            search: SearchParams::default(),
        }
    }
}

/// Parameters of the plausible-model filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibleParams {
    /// AIC tolerance `Δ` above the global minimum.
    pub delta_aic: f64,
    /// Minimum average stability `τ` (ignored without a stability result).
    pub min_stability: f64,
    pub remove_duplicates: bool,
    /// Pairs with Jaccard similarity strictly above this are near-duplicates.
    pub jaccard_threshold: f64,
    /// Refit each surviving model on the full data.
    pub refit: bool,
}

impl Default for PlausibleParams {
    fn default() -> Self {
        Self {
            delta_aic: 2.0,
            min_stability: 0.6,
            remove_duplicates: true,
            jaccard_threshold: 0.9,
            refit: false,
        }
    }
}

/// Synthetic data settings for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub n: usize,
    pub p: usize,
    pub family: Family,
    /// `(predictor name, coefficient)` pairs; unnamed predictors have no effect.
    pub signal: Vec<(String, f64)>,
    pub intercept: f64,
    /// Noise standard deviation (gaussian only).
    pub noise_sd: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            n: 200,
            p: 5,
            family: Family::Gaussian,
            signal: vec![("x1".to_string(), 1.0), ("x2".to_string(), 0.5)],
            intercept: 0.0,
            noise_sd: 1.0,
            seed: 42,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub sample: SampleConfig,
    pub search: SearchParams,
    pub stability: StabilityParams,
    pub plausible: PlausibleParams,
    /// Skip the stability step (plausible filter runs on AIC alone).
    pub skip_stability: bool,
    /// Threshold for the classification summary of binomial refits.
    pub class_threshold: f64,
    pub json: bool,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sample: SampleConfig::default(),
            search: SearchParams::default(),
            stability: StabilityParams::default(),
            plausible: PlausibleParams::default(),
            skip_stability: false,
            class_threshold: 0.5,
            json: false,
            progress: false,
        }
    }
}
