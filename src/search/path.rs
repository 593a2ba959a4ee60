//! Multi-path forward selection scored by AIC.
//!
//! The search grows a tree breadth-first from the intercept-only model. At each
//! depth every retained parent proposes one child per unused predictor:
//!
//! 1. A parent whose best child does not improve its AIC by at least `eps` is
//!    pruned (none of its children survive).
//! 2. Otherwise every child within `delta` of that parent's best child is kept,
//!    so near-ties open parallel paths instead of being decided by noise.
//! 3. Kept children from all parents are pooled, deduplicated by variable set,
//!    sorted by AIC and capped at `L`. The pool is the frontier for this depth
//!    and the parent set for the next.
//!
//! The search stops at depth `K` or as soon as a depth produces no children.
//!
//! Candidate fits that fail score `+inf`, which the `eps`/`delta` rules filter
//! out naturally. Sibling fits of one parent are evaluated in parallel; the
//! collected order is the column order, so results do not depend on scheduling.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::Dataset;
use crate::domain::{DEFAULT_MAX_DEPTH, Family, Model, SearchParams};
use crate::error::{Result, SelectError};
use crate::fit::ModelFitter;
use crate::search::progress::{Progress, ProgressEvent};

/// Distinct models retained at one depth, ascending by AIC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frontier {
    /// 1-indexed; every model here has exactly `depth` predictors.
    pub depth: usize,
    pub models: Vec<Model>,
}

/// Run metadata: data shape plus the effective algorithm parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMeta {
    pub n: usize,
    pub p: usize,
    pub family: Family,
    pub predictors: Vec<String>,
    /// Effective `K` after defaulting and clamping.
    pub max_depth: usize,
    pub eps: f64,
    pub delta: f64,
    pub max_models: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSearchResult {
    frontiers: Vec<Frontier>,
    aic_by_id: BTreeMap<String, f64>,
    empty: Model,
    meta: SearchMeta,
}

impl PathSearchResult {
    /// Frontiers for depths `1..=len`, possibly fewer than `K` on early stop.
    pub fn frontiers(&self) -> &[Frontier] {
        &self.frontiers
    }

    /// All retained models, depth by depth.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.frontiers.iter().flat_map(|f| f.models.iter())
    }

    pub fn n_models(&self) -> usize {
        self.frontiers.iter().map(|f| f.models.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frontiers.is_empty()
    }

    /// Lowest-AIC retained model; the first one found on ties.
    pub fn best(&self) -> Option<&Model> {
        self.models()
            .fold(None, |best: Option<&Model>, m| match best {
                Some(b) if b.score <= m.score => Some(b),
                _ => Some(m),
            })
    }

    pub fn aic(&self, id: &str) -> Option<f64> {
        self.aic_by_id.get(id).copied()
    }

    /// AIC of every retained model keyed by canonical id.
    pub fn aic_map(&self) -> &BTreeMap<String, f64> {
        &self.aic_by_id
    }

    /// The depth-0 seed (intercept only). Not part of any frontier.
    pub fn empty_model(&self) -> &Model {
        &self.empty
    }

    pub fn meta(&self) -> &SearchMeta {
        &self.meta
    }
}

/// Resolve `K` for `p` predictors and check the remaining parameters.
pub fn resolve_params(params: &SearchParams, p: usize) -> Result<usize> {
    if !params.eps.is_finite() {
        return Err(SelectError::invalid("eps must be finite."));
    }
    if !(params.delta.is_finite() && params.delta >= 0.0) {
        return Err(SelectError::invalid("delta must be finite and >= 0."));
    }
    if params.max_models == 0 {
        return Err(SelectError::invalid("max_models (L) must be >= 1."));
    }

    match params.max_depth {
        None => Ok(p.min(DEFAULT_MAX_DEPTH)),
        Some(0) => Err(SelectError::invalid("max_depth (K) must be >= 1.")),
        Some(k) if k > p => {
            warn!(requested = k, predictors = p, "max_depth exceeds predictor count; clamping");
            Ok(p)
        }
        Some(k) => Ok(k),
    }
}

/// Run the multi-path forward search on `data`.
pub fn run(
    data: &Dataset,
    family: Family,
    params: &SearchParams,
    fitter: &dyn ModelFitter,
    progress: &Progress,
) -> Result<PathSearchResult> {
    let p = data.p();
    let max_depth = resolve_params(params, p)?;
    data.validate_response(family)?;

    let predictors = data.names().to_vec();
    let score = |columns: &[usize]| -> f64 {
        match fitter.aic(data, columns, family) {
            Ok(aic) if aic.is_finite() => aic,
            Ok(aic) => {
                debug!(?columns, aic, "non-finite AIC; scoring candidate as +inf");
                f64::INFINITY
            }
            Err(err) => {
                debug!(?columns, %err, "candidate fit failed; scoring as +inf");
                f64::INFINITY
            }
        }
    };

    let empty = Model::empty(score(&[]));
    progress.emit(ProgressEvent::SearchStarted {
        predictors: p,
        max_depth,
    });

    let mut frontiers: Vec<Frontier> = Vec::new();
    let mut aic_by_id = BTreeMap::new();
    let mut parents = vec![empty.clone()];

    for depth in 1..=max_depth {
        // The same child is usually proposed by several parents at one depth.
        let mut cache: HashMap<Vec<usize>, f64> = HashMap::new();
        let mut pool: Vec<Model> = Vec::new();

        for parent in &parents {
            let child_columns: Vec<Vec<usize>> = (0..p)
                .filter(|&c| !parent.contains_column(c))
                .map(|c| {
                    let mut cols = parent.columns.clone();
                    cols.push(c);
                    cols.sort_unstable();
                    cols
                })
                .collect();
            if child_columns.is_empty() {
                continue;
            }

            let fresh: Vec<(Vec<usize>, f64)> = child_columns
                .par_iter()
                .filter(|cols| !cache.contains_key(*cols))
                .map(|cols| (cols.clone(), score(cols)))
                .collect();
            cache.extend(fresh);

            let children: Vec<Model> = child_columns
                .into_iter()
                .map(|cols| {
                    let s = cache[&cols];
                    Model::new(cols, &predictors, s, Some(parent.id.clone()))
                })
                .collect();

            let best = children
                .iter()
                .map(|m| m.score)
                .fold(f64::INFINITY, f64::min);
            if !best.is_finite() {
                continue;
            }
            if parent.score - best < params.eps {
                continue;
            }
            pool.extend(children.into_iter().filter(|m| m.score <= best + params.delta));
        }

        if pool.is_empty() {
            debug!(depth, "no parent produced a viable child; stopping");
            progress.emit(ProgressEvent::SearchStopped { depth });
            break;
        }

        let candidates = pool.len();
        let mut seen = HashSet::with_capacity(pool.len());
        pool.retain(|m| seen.insert(m.id.clone()));
        // Stable: exact ties keep insertion order.
        pool.sort_by(|a, b| a.score.total_cmp(&b.score));
        pool.truncate(params.max_models);

        for m in &pool {
            aic_by_id.entry(m.id.clone()).or_insert(m.score);
        }

        debug!(depth, candidates, retained = pool.len(), best = pool[0].score, "depth complete");
        progress.emit(ProgressEvent::DepthCompleted {
            depth,
            candidates,
            retained: pool.len(),
            best_score: pool[0].score,
        });

        parents = pool.clone();
        frontiers.push(Frontier {
            depth,
            models: pool,
        });
    }

    Ok(PathSearchResult {
        frontiers,
        aic_by_id,
        empty,
        meta: SearchMeta {
            n: data.n(),
            p,
            family,
            predictors,
            max_depth,
            eps: params.eps,
            delta: params.delta,
            max_models: params.max_models,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_sample;
    use crate::domain::SampleConfig;
    use crate::error::FitFailure;
    use crate::fit::GlmFitter;
    use crate::fit::testing::{ScriptedFitter, additive, blank_data};

    fn search(data: &Dataset, params: &SearchParams, fitter: &dyn ModelFitter) -> PathSearchResult {
        run(data, Family::Gaussian, params, fitter, &Progress::none()).unwrap()
    }

    #[test]
    fn strong_signal_leads_each_depth() {
        let data = generate_sample(&SampleConfig::default()).unwrap();
        let params = SearchParams {
            max_depth: Some(3),
            ..SearchParams::default()
        };
        let result = search(&data, &params, &GlmFitter::default());

        let depth1 = &result.frontiers()[0];
        assert_eq!(depth1.models[0].id, "x1");
        assert!(result.frontiers().len() >= 2);
        let depth2 = &result.frontiers()[1];
        assert_eq!(depth2.models[0].id, "x1+x2");
        assert_eq!(result.best().map(|m| m.size() >= 2), Some(true));
    }

    #[test]
    fn nothing_improves_gives_zero_frontiers() {
        let data = blank_data(10, 4);
        let fitter = ScriptedFitter(additive(100.0, vec![0.0; 4], 2.0));
        let result = search(&data, &SearchParams::default(), &fitter);
        assert!(result.is_empty());
        assert_eq!(result.n_models(), 0);
        assert!(result.aic_map().is_empty());
        assert_eq!(result.empty_model().score, 100.0);
    }

    #[test]
    fn delta_window_is_relative_to_parent_best() {
        let data = blank_data(10, 4);
        // Depth-1 scores: x1=92, x2=97, x3=101.5, x4=102.
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 5.0, 0.5, 0.0], 2.0));

        let narrow = SearchParams {
            max_depth: Some(1),
            delta: 1.0,
            ..SearchParams::default()
        };
        let ids: Vec<_> = search(&data, &narrow, &fitter).frontiers()[0]
            .models
            .iter()
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(ids, vec!["x1"]);

        let wide = SearchParams {
            max_depth: Some(1),
            delta: 6.0,
            ..SearchParams::default()
        };
        let ids: Vec<_> = search(&data, &wide, &fitter).frontiers()[0]
            .models
            .iter()
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(ids, vec!["x1", "x2"]);
    }

    #[test]
    fn models_grow_by_one_variable_from_a_retained_parent() {
        let data = blank_data(10, 5);
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 9.5, 9.0, 3.0, 2.5], 2.0));
        let params = SearchParams {
            delta: 3.0,
            ..SearchParams::default()
        };
        let result = search(&data, &params, &fitter);
        assert!(result.frontiers().len() >= 3);

        for (k, frontier) in result.frontiers().iter().enumerate() {
            assert_eq!(frontier.depth, k + 1);
            for m in &frontier.models {
                assert_eq!(m.size(), frontier.depth);
                let parent_id = m.parent_id.as_deref().unwrap();
                let parent = if k == 0 {
                    result.empty_model()
                } else {
                    result.frontiers()[k - 1]
                        .models
                        .iter()
                        .find(|p| p.id == parent_id)
                        .expect("parent retained at previous depth")
                };
                assert!(parent.columns.iter().all(|c| m.columns.contains(c)));
            }
        }
    }

    #[test]
    fn frontier_is_deduplicated_and_capped() {
        let data = blank_data(10, 6);
        // Equal gains: every child ties, so every set is proposed by many parents.
        let fitter = ScriptedFitter(additive(100.0, vec![5.0; 6], 2.0));
        let params = SearchParams {
            max_models: 4,
            ..SearchParams::default()
        };
        let result = search(&data, &params, &fitter);

        for frontier in result.frontiers() {
            assert!(frontier.models.len() <= 4);
            let ids: HashSet<_> = frontier.models.iter().map(|m| &m.id).collect();
            assert_eq!(ids.len(), frontier.models.len());
        }
        // Ties are broken by insertion order: x1 first, then x2 ...
        let first: Vec<_> = result.frontiers()[0].models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(first, vec!["x1", "x2", "x3", "x4"]);
    }

    #[test]
    fn failed_fits_are_excluded_not_fatal() {
        let data = blank_data(10, 3);
        let base = additive(100.0, vec![10.0, 5.0, 1.0], 2.0);
        let fitter = ScriptedFitter(move |cols: &[usize]| {
            if cols.contains(&0) {
                Err(FitFailure::Separation)
            } else {
                base(cols)
            }
        });
        let result = search(&data, &SearchParams::default(), &fitter);
        assert!(!result.is_empty());
        assert!(result.models().all(|m| !m.columns.contains(&0)));
        assert!(result.models().all(|m| m.score.is_finite()));
    }

    #[test]
    fn failed_root_still_expands_finite_children() {
        let data = blank_data(10, 2);
        let base = additive(100.0, vec![3.0, 1.0], 2.0);
        let fitter = ScriptedFitter(move |cols: &[usize]| {
            if cols.is_empty() {
                Err(FitFailure::NonFinite)
            } else {
                base(cols)
            }
        });
        let result = search(&data, &SearchParams::default(), &fitter);
        assert_eq!(result.empty_model().score, f64::INFINITY);
        assert_eq!(result.frontiers()[0].models[0].id, "x1");
    }

    #[test]
    fn max_depth_defaults_and_clamps() {
        let data = blank_data(10, 3);
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 9.0, 8.0], 2.0));

        let result = search(&data, &SearchParams::default(), &fitter);
        assert_eq!(result.meta().max_depth, 3);

        let params = SearchParams {
            max_depth: Some(12),
            ..SearchParams::default()
        };
        let result = search(&data, &params, &fitter);
        assert_eq!(result.meta().max_depth, 3);
        assert_eq!(result.frontiers().len(), 3);
        assert_eq!(result.frontiers()[2].models[0].id, "x1+x2+x3");
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let data = blank_data(10, 3);
        let fitter = GlmFitter::default();
        for params in [
            SearchParams {
                max_depth: Some(0),
                ..SearchParams::default()
            },
            SearchParams {
                max_models: 0,
                ..SearchParams::default()
            },
            SearchParams {
                delta: -1.0,
                ..SearchParams::default()
            },
        ] {
            let err = run(&data, Family::Gaussian, &params, &fitter, &Progress::none()).unwrap_err();
            assert!(matches!(err, SelectError::InvalidInput(_)));
        }
    }

    #[test]
    fn binomial_requires_binary_response() {
        let data = Dataset::from_columns(vec![("a".into(), vec![1.0, 2.0, 3.0])], vec![0.0, 2.0, 1.0])
            .unwrap();
        let err = run(
            &data,
            Family::Binomial,
            &SearchParams::default(),
            &GlmFitter::default(),
            &Progress::none(),
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::InvalidInput(_)));
    }

    #[test]
    fn emits_progress_per_depth() {
        let data = blank_data(10, 3);
        let fitter = ScriptedFitter(additive(100.0, vec![10.0, 0.0, 0.0], 2.0));
        let (progress, rx) = Progress::channel();
        let result = run(&data, Family::Gaussian, &SearchParams::default(), &fitter, &progress).unwrap();
        drop(progress);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(result.frontiers().len(), 1);
        assert!(matches!(events[0], ProgressEvent::SearchStarted { predictors: 3, .. }));
        assert!(matches!(events[1], ProgressEvent::DepthCompleted { depth: 1, retained: 1, .. }));
        assert_eq!(events[2], ProgressEvent::SearchStopped { depth: 2 });
    }

    #[test]
    fn repeated_runs_are_identical() {
        let data = generate_sample(&SampleConfig::default()).unwrap();
        let a = search(&data, &SearchParams::default(), &GlmFitter::default());
        let b = search(&data, &SearchParams::default(), &GlmFitter::default());
        assert_eq!(a, b);
    }
}
