//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the search
//! - printed as a JSON run report
//! - handed to presentation layers that only need read-only access

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Identifier of the intercept-only model.
pub const EMPTY_ID: &str = "EMPTY";

/// Separator between variable names in a canonical model id.
pub const ID_SEPARATOR: char = '+';

/// Response distribution (and its canonical link) used for every fit in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Normal response, identity link (ordinary least squares).
    Gaussian,
    /// 0/1 response, logit link (IRLS).
    Binomial,
}

impl Family {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian (identity)",
            Family::Binomial => "binomial (logit)",
        }
    }
}

/// How stability resamples are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResampleKind {
    /// `n` row indices drawn uniformly with replacement.
    Bootstrap,
    /// `m` row indices drawn uniformly without replacement.
    Subsample,
}

/// A candidate regression model: intercept plus a set of predictors.
///
/// Identity is the variable set. `id` is canonical: variable names sorted
/// lexicographically and joined with `+`, or [`EMPTY_ID`] for the
/// intercept-only model, so discovery order never matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    /// Predictor names, sorted lexicographically.
    pub variables: Vec<String>,
    /// Column indices of the predictors, sorted ascending.
    pub columns: Vec<usize>,
    /// AIC (lower is better). `+inf` when the fit failed.
    pub score: f64,
    /// Provenance only: the model this one was expanded from.
    pub parent_id: Option<String>,
}

impl Model {
    /// Build a model from column indices into `predictors`.
    ///
    /// # Panics
    /// Panics if a column index is out of range for `predictors`. Callers only
    /// pass indices derived from the same predictor list.
    pub fn new(
        mut columns: Vec<usize>,
        predictors: &[String],
        score: f64,
        parent_id: Option<String>,
    ) -> Self {
        columns.sort_unstable();
        columns.dedup();

        let mut variables: Vec<String> = columns.iter().map(|&c| predictors[c].clone()).collect();
        variables.sort();
        let id = canonical_id(&variables);

        Self {
            id,
            variables,
            columns,
            score,
            parent_id,
        }
    }

    /// The intercept-only model.
    pub fn empty(score: f64) -> Self {
        Self {
            id: EMPTY_ID.to_string(),
            variables: Vec::new(),
            columns: Vec::new(),
            score,
            parent_id: None,
        }
    }

    /// Number of predictors (excluding the intercept).
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains_column(&self, column: usize) -> bool {
        self.columns.binary_search(&column).is_ok()
    }
}

/// Canonical id for a set of variable names, independent of their order.
pub fn canonical_id<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        return EMPTY_ID.to_string();
    }
    let mut sorted: Vec<&str> = names.iter().map(|s| s.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(&ID_SEPARATOR.to_string())
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` of two sorted column sets.
///
/// Two empty sets are identical, so their similarity is 1.
pub fn jaccard(a: &[usize], b: &[usize]) -> f64 {
    let (mut i, mut j, mut inter) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                inter += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let union = a.len() + b.len() - inter;
    if union == 0 {
        1.0
    } else {
        inter as f64 / union as f64
    }
}
