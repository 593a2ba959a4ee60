//! Resampling stability of variable selection.
//!
//! For each of `B` resamples (bootstrap or subsample) the full path search is
//! rerun, and for every predictor `j` we record
//!
//! ```text
//! z_bj = (# retained models containing j) / (# retained models, all depths)
//! ```
//!
//! The stability score is `π_j = mean_b z_bj`.
//!
//! Resamples are independent, so they run on a bounded rayon pool. Each one
//! seeds its own generator from `(seed, b)` and its row of `z` is stored at
//! index `b`, which keeps the result bit-for-bit reproducible regardless of the
//! worker count or completion order.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::Dataset;
use crate::domain::{Family, ResampleKind, SearchParams, StabilityParams};
use crate::error::{Result, SelectError};
use crate::fit::ModelFitter;
use crate::search::path::{self, PathSearchResult};
use crate::search::progress::{Progress, ProgressEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct StabilityResult {
    predictors: Vec<String>,
    pi: Vec<f64>,
    z: DMatrix<f64>,
    failed: Vec<usize>,
    kind: ResampleKind,
    sample_size: usize,
}

impl StabilityResult {
    /// Predictor names, in column order. `pi()` and the columns of
    /// `selection_matrix()` follow this order.
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    pub fn pi(&self) -> &[f64] {
        &self.pi
    }

    pub fn pi_of(&self, name: &str) -> Option<f64> {
        self.predictors
            .iter()
            .position(|p| p == name)
            .map(|j| self.pi[j])
    }

    /// `B×p` matrix of per-resample selection proportions; row `b` is resample `b`.
    pub fn selection_matrix(&self) -> &DMatrix<f64> {
        &self.z
    }

    pub fn resamples(&self) -> usize {
        self.z.nrows()
    }

    /// Indices of resamples whose search failed (their rows are all zero).
    pub fn failed(&self) -> &[usize] {
        &self.failed
    }

    pub fn kind(&self) -> ResampleKind {
        self.kind
    }

    /// Rows drawn per resample (`n` for bootstrap, `m` for subsample).
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Predictors by descending stability; ties keep column order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self
            .predictors
            .iter()
            .map(String::as_str)
            .zip(self.pi.iter().copied())
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

/// Serializable view: `pi` keyed by predictor plus the raw matrix rows.
#[derive(Debug, Clone, Serialize)]
pub struct StabilitySummary {
    pub kind: ResampleKind,
    pub resamples: usize,
    pub sample_size: usize,
    pub pi: Vec<(String, f64)>,
    pub failed: Vec<usize>,
    pub matrix: Vec<Vec<f64>>,
}

impl From<&StabilityResult> for StabilitySummary {
    fn from(result: &StabilityResult) -> Self {
        Self {
            kind: result.kind,
            resamples: result.resamples(),
            sample_size: result.sample_size,
            pi: result
                .predictors
                .iter()
                .cloned()
                .zip(result.pi.iter().copied())
                .collect(),
            failed: result.failed.clone(),
            matrix: result
                .z
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
        }
    }
}

/// Rows drawn per resample.
pub fn resolve_sample_size(params: &StabilityParams, n: usize) -> Result<usize> {
    match params.kind {
        ResampleKind::Bootstrap => Ok(n),
        ResampleKind::Subsample => {
            let m = params
                .subsample_size
                .unwrap_or_else(|| (n as f64).sqrt().ceil() as usize);
            if m == 0 || m > n {
                return Err(SelectError::invalid(format!(
                    "Subsample size must be in 1..={n}, got {m}."
                )));
            }
            Ok(m)
        }
    }
}

/// Estimate selection stability of every predictor.
pub fn run(
    data: &Dataset,
    family: Family,
    params: &StabilityParams,
    fitter: &dyn ModelFitter,
    progress: &Progress,
) -> Result<StabilityResult> {
    let n = data.n();
    let p = data.p();
    let total = params.resamples;
    if total == 0 {
        return Err(SelectError::invalid("Number of resamples (B) must be >= 1."));
    }
    if params.workers == Some(0) {
        return Err(SelectError::invalid("Worker count must be >= 1."));
    }
    let sample_size = resolve_sample_size(params, n)?;
    data.validate_response(family)?;

    // Resolve K once so the clamp warning is not repeated per resample.
    let search = SearchParams {
        max_depth: Some(path::resolve_params(&params.search, p)?),
        ..params.search.clone()
    };

    let task = |b: usize| -> Option<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(resample_seed(params.seed, b));
        let rows = draw_rows(&mut rng, n, params.kind, sample_size);
        let sample = data.select_rows(&rows);

        let z = match path::run(&sample, family, &search, fitter, &Progress::none()) {
            Ok(result) => Some(selection_proportions(&result, p)),
            Err(err) => {
                warn!(resample = b, %err, "resample search failed; counting it as selecting nothing");
                None
            }
        };
        progress.emit(ProgressEvent::ResampleFinished {
            index: b,
            total,
            ok: z.is_some(),
        });
        z
    };

    let rows: Vec<Option<Vec<f64>>> = match params.workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| SelectError::WorkerPool(e.to_string()))?;
            pool.install(|| (0..total).into_par_iter().map(|b| task(b)).collect())
        }
        None => (0..total).into_par_iter().map(|b| task(b)).collect(),
    };

    let mut z = DMatrix::<f64>::zeros(total, p);
    let mut failed = Vec::new();
    for (b, row) in rows.into_iter().enumerate() {
        match row {
            Some(values) => {
                for (j, v) in values.into_iter().enumerate() {
                    z[(b, j)] = v;
                }
            }
            None => failed.push(b),
        }
    }

    let pi: Vec<f64> = (0..p).map(|j| z.column(j).sum() / total as f64).collect();
    debug!(resamples = total, failed = failed.len(), "stability estimate complete");

    Ok(StabilityResult {
        predictors: data.names().to_vec(),
        pi,
        z,
        failed,
        kind: params.kind,
        sample_size,
    })
}

/// Share of retained models (all depths) that contain each predictor.
///
/// A search that retained no models selects nothing: all zeros.
pub fn selection_proportions(result: &PathSearchResult, p: usize) -> Vec<f64> {
    let total = result.n_models();
    let mut counts = vec![0usize; p];
    for m in result.models() {
        for &c in &m.columns {
            counts[c] += 1;
        }
    }
    if total == 0 {
        return vec![0.0; p];
    }
    counts.into_iter().map(|c| c as f64 / total as f64).collect()
}

fn draw_rows(rng: &mut StdRng, n: usize, kind: ResampleKind, m: usize) -> Vec<usize> {
    match kind {
        ResampleKind::Bootstrap => (0..n).map(|_| rng.gen_range(0..n)).collect(),
        ResampleKind::Subsample => rand::seq::index::sample(rng, n, m).into_vec(),
    }
}

/// Per-resample seed: a SplitMix64 mix of the base seed and the resample index.
fn resample_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_sample;
    use crate::domain::SampleConfig;
    use crate::error::FitFailure;
    use crate::fit::GlmFitter;
    use crate::fit::testing::{ScriptedFitter, additive, blank_data};

    fn params(resamples: usize) -> StabilityParams {
        StabilityParams {
            resamples,
            search: SearchParams {
                max_depth: Some(3),
                ..SearchParams::default()
            },
            ..StabilityParams::default()
        }
    }

    #[test]
    fn signal_variables_are_most_stable() {
        let data = generate_sample(&SampleConfig::default()).unwrap();
        let result = run(&data, Family::Gaussian, &params(12), &GlmFitter::default(), &Progress::none())
            .unwrap();

        assert_eq!(result.selection_matrix().shape(), (12, 5));
        assert!(result.failed().is_empty());
        let ranked = result.ranked();
        assert_eq!(ranked[0].0, "x1");
        assert!(result.pi_of("x1").unwrap() > result.pi_of("x5").unwrap());
        assert!(result.pi().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn same_seed_reproduces_bit_for_bit_across_worker_counts() {
        let data = generate_sample(&SampleConfig {
            n: 80,
            ..SampleConfig::default()
        })
        .unwrap();
        let fitter = GlmFitter::default();

        let single = StabilityParams {
            workers: Some(1),
            ..params(6)
        };
        let many = StabilityParams {
            workers: Some(4),
            ..params(6)
        };
        let a = run(&data, Family::Gaussian, &single, &fitter, &Progress::none()).unwrap();
        let b = run(&data, Family::Gaussian, &many, &fitter, &Progress::none()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn resample_seeds_differ_per_index() {
        let seeds: std::collections::HashSet<u64> = (0..100).map(|b| resample_seed(42, b)).collect();
        assert_eq!(seeds.len(), 100);
        assert_ne!(resample_seed(42, 0), resample_seed(43, 0));
    }

    #[test]
    fn never_selected_is_zero_and_always_selected_is_one() {
        let data = blank_data(12, 3);
        // x1 always improves the fit; x2 and x3 never do.
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 0.0, 0.0], 2.0));
        let result = run(&data, Family::Gaussian, &params(5), &fitter, &Progress::none()).unwrap();
        assert_eq!(result.pi(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_searches_contribute_zero_rows() {
        let data = blank_data(12, 3);
        let fitter = ScriptedFitter(|_: &[usize]| Err(FitFailure::NonFinite));
        let result = run(&data, Family::Gaussian, &params(4), &fitter, &Progress::none()).unwrap();
        assert!(result.selection_matrix().iter().all(|&v| v == 0.0));
        assert_eq!(result.pi(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn subsample_size_defaults_to_ceil_sqrt_n() {
        let p = StabilityParams {
            kind: ResampleKind::Subsample,
            ..StabilityParams::default()
        };
        assert_eq!(resolve_sample_size(&p, 50).unwrap(), 8);
        assert_eq!(resolve_sample_size(&p, 49).unwrap(), 7);

        let too_big = StabilityParams {
            subsample_size: Some(51),
            ..p.clone()
        };
        assert!(resolve_sample_size(&too_big, 50).is_err());
        assert_eq!(resolve_sample_size(&StabilityParams::default(), 50).unwrap(), 50);
    }

    #[test]
    fn subsample_draws_distinct_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut rows = draw_rows(&mut rng, 30, ResampleKind::Subsample, 10);
        assert_eq!(rows.len(), 10);
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|&r| r < 30));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let data = blank_data(12, 3);
        let fitter = GlmFitter::default();
        for bad in [
            params(0),
            StabilityParams {
                workers: Some(0),
                ..params(3)
            },
            StabilityParams {
                kind: ResampleKind::Subsample,
                subsample_size: Some(0),
                ..params(3)
            },
        ] {
            let err = run(&data, Family::Gaussian, &bad, &fitter, &Progress::none()).unwrap_err();
            assert!(matches!(err, SelectError::InvalidInput(_)));
        }
    }

    #[test]
    fn reports_each_resample() {
        let data = blank_data(12, 3);
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 0.0, 0.0], 2.0));
        let (progress, rx) = Progress::channel();
        run(&data, Family::Gaussian, &params(5), &fitter, &progress).unwrap();
        drop(progress);

        let mut seen: Vec<usize> = rx
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ResampleFinished { index, total: 5, ok: true } => Some(index),
                _ => None,
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
