//! Plausible-model shortlist.
//!
//! Combines one path search with (optionally) a stability estimate:
//!
//! 1. flatten all retained models, deduplicated by id
//! 2. keep models with `AIC <= AIC_min + Δ`
//! 3. with stability: keep models whose mean `π_j` over their variables is `>= τ`
//!    (the intercept-only model scores 0)
//! 4. optionally drop near-duplicates: for pairs with Jaccard similarity above
//!    the threshold the worse AIC goes (the later one on exact ties)
//! 5. sort ascending by AIC and record `delta_aic = AIC - AIC_min`
//! 6. optionally refit every survivor on the full data
//!
//! An empty shortlist is a valid outcome, not an error.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::data::Dataset;
use crate::domain::{Family, Model, PlausibleParams, jaccard};
use crate::error::{Result, SelectError};
use crate::fit::{FittedModel, ModelFitter};
use crate::search::path::PathSearchResult;
use crate::search::stability::StabilityResult;

/// One shortlisted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlausibleEntry {
    pub model: Model,
    pub aic: f64,
    pub delta_aic: f64,
    /// Mean stability over the model's variables, when stability was supplied.
    pub avg_stability: Option<f64>,
    /// Full-data fit, when refit was requested.
    pub fitted: Option<FittedModel>,
}

impl PlausibleEntry {
    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn size(&self) -> usize {
        self.model.size()
    }

    pub fn variables(&self) -> &[String] {
        &self.model.variables
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlausibleModelSet {
    entries: Vec<PlausibleEntry>,
    aic_min: f64,
    family: Family,
}

impl PlausibleModelSet {
    /// Entries ascending by AIC.
    pub fn entries(&self) -> &[PlausibleEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlausibleEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&PlausibleEntry> {
        self.entries.first()
    }

    /// Minimum AIC over all retained models of the search (before filtering).
    pub fn aic_min(&self) -> f64 {
        self.aic_min
    }

    pub fn family(&self) -> Family {
        self.family
    }
}

/// Full-data refit inputs.
#[derive(Clone, Copy)]
pub struct Refit<'a> {
    pub data: &'a Dataset,
    pub fitter: &'a dyn ModelFitter,
}

/// Mean stability over `model`'s variables; 0 for the intercept-only model.
pub fn average_stability(model: &Model, pi: &[f64]) -> f64 {
    if model.is_empty() {
        return 0.0;
    }
    model.columns.iter().map(|&c| pi[c]).sum::<f64>() / model.size() as f64
}

/// Build the plausible-model shortlist.
pub fn run(
    path: &PathSearchResult,
    stability: Option<&StabilityResult>,
    params: &PlausibleParams,
    refit: Option<Refit<'_>>,
) -> Result<PlausibleModelSet> {
    validate(path, stability, params, refit)?;
    let family = path.meta().family;

    // 1. Flatten.
    let mut seen = HashSet::new();
    let flat: Vec<&Model> = path.models().filter(|m| seen.insert(m.id.as_str())).collect();

    // 2. AIC window.
    let aic_min = flat.iter().map(|m| m.score).fold(f64::INFINITY, f64::min);
    let mut survivors: Vec<(&Model, Option<f64>)> = flat
        .into_iter()
        .filter(|m| m.score <= aic_min + params.delta_aic)
        .map(|m| (m, None))
        .collect();

    // 3. Stability.
    if let Some(stability) = stability {
        survivors = survivors
            .into_iter()
            .map(|(m, _)| (m, Some(average_stability(m, stability.pi()))))
            .filter(|(_, avg)| avg.is_some_and(|a| a >= params.min_stability))
            .collect();
    }

    // 4. Near-duplicates.
    if params.remove_duplicates {
        survivors = remove_near_duplicates(survivors, params.jaccard_threshold);
    }

    // 5. Order.
    survivors.sort_by(|a, b| a.0.score.total_cmp(&b.0.score));

    let mut entries = Vec::with_capacity(survivors.len());
    for (model, avg_stability) in survivors {
        // 6. Refit.
        let fitted = match (params.refit, refit) {
            (true, Some(r)) => Some(refit_model(model, r, family)?),
            _ => None,
        };
        entries.push(PlausibleEntry {
            model: model.clone(),
            aic: model.score,
            delta_aic: model.score - aic_min,
            avg_stability,
            fitted,
        });
    }

    debug!(retained = entries.len(), aic_min, "plausible filter complete");
    Ok(PlausibleModelSet {
        entries,
        aic_min,
        family,
    })
}

fn validate(
    path: &PathSearchResult,
    stability: Option<&StabilityResult>,
    params: &PlausibleParams,
    refit: Option<Refit<'_>>,
) -> Result<()> {
    if !(params.delta_aic.is_finite() && params.delta_aic >= 0.0) {
        return Err(SelectError::invalid("AIC tolerance (Δ) must be finite and >= 0."));
    }
    if params.min_stability.is_nan() {
        return Err(SelectError::invalid("Minimum stability (τ) must not be NaN."));
    }
    if !(0.0..=1.0).contains(&params.jaccard_threshold) {
        return Err(SelectError::invalid("Jaccard threshold must be in [0, 1]."));
    }
    if path.is_empty() {
        return Err(SelectError::invalid(
            "The path search retained no models; nothing to filter.",
        ));
    }

    let predictors = &path.meta().predictors;
    if let Some(stability) = stability {
        if stability.predictors() != predictors.as_slice() {
            return Err(SelectError::invalid(
                "Stability result was computed over different predictors than the path search.",
            ));
        }
    }

    if params.refit {
        let Some(refit) = refit else {
            return Err(SelectError::invalid("Refit requested but no data was supplied."));
        };
        let expected: BTreeSet<&str> = predictors.iter().map(String::as_str).collect();
        let got: BTreeSet<&str> = refit.data.names().iter().map(String::as_str).collect();
        if expected != got {
            let missing: Vec<&str> = expected.difference(&got).copied().collect();
            let extra: Vec<&str> = got.difference(&expected).copied().collect();
            return Err(SelectError::invalid(format!(
                "Refit data predictors do not match the search (missing: {missing:?}, unexpected: {extra:?})."
            )));
        }
        refit.data.validate_response(path.meta().family)?;
    }
    Ok(())
}

/// Pairwise sweep in discovery order. A pair above `threshold` loses its worse
/// AIC; on an exact tie the later model goes.
fn remove_near_duplicates<'a>(
    candidates: Vec<(&'a Model, Option<f64>)>,
    threshold: f64,
) -> Vec<(&'a Model, Option<f64>)> {
    let mut keep = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if !keep[j] {
                continue;
            }
            let (a, b) = (candidates[i].0, candidates[j].0);
            if jaccard(&a.columns, &b.columns) > threshold {
                if b.score < a.score {
                    keep[i] = false;
                    break;
                }
                keep[j] = false;
            }
        }
    }
    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}

fn refit_model(model: &Model, refit: Refit<'_>, family: Family) -> Result<FittedModel> {
    let mut columns = Vec::with_capacity(model.size());
    for name in &model.variables {
        let Some(j) = refit.data.column_index(name) else {
            return Err(SelectError::invalid(format!("Refit data has no column '{name}'.")));
        };
        columns.push(j);
    }
    Ok(refit.fitter.fit(refit.data, &columns, family)?)
}
