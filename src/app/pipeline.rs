//! Shared pipeline logic behind every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! sample generation -> path search -> stability -> plausible shortlist -> refit
//!
//! The CLI then only decides how far to go and how to present the results.

use tracing::info;

use crate::data::{Dataset, generate_sample};
use crate::domain::{Family, RunConfig};
use crate::error::Result;
use crate::fit::{FittedModel, GlmFitter, ModelFitter};
use crate::report::{ClassificationReport, RunReport, classify};
use crate::search::{PathSearchResult, PlausibleModelSet, Progress, Refit, StabilityResult, path, plausible, stability};

/// How far down the pipeline a run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Stability,
    Plausible,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: Dataset,
    pub search: PathSearchResult,
    pub stability: Option<StabilityResult>,
    pub plausible: Option<PlausibleModelSet>,
    /// Full-data fit of the top shortlisted model.
    pub best_fit: Option<FittedModel>,
    /// Binomial runs only: in-sample classification of `best_fit`.
    pub classification: Option<ClassificationReport>,
}

impl RunOutput {
    pub fn to_report(&self, config: &RunConfig) -> RunReport {
        RunReport {
            config: config.clone(),
            search: self.search.clone(),
            stability: self.stability.as_ref().map(Into::into),
            plausible: self.plausible.clone(),
            classification: self.classification,
        }
    }
}

/// Execute the pipeline up to `stage` with the default fitter.
pub fn run_pipeline(config: &RunConfig, stage: Stage, progress: &Progress) -> Result<RunOutput> {
    run_pipeline_with(config, stage, &GlmFitter::default(), progress)
}

/// Execute the pipeline up to `stage` with a caller-supplied fitter.
pub fn run_pipeline_with(
    config: &RunConfig,
    stage: Stage,
    fitter: &dyn ModelFitter,
    progress: &Progress,
) -> Result<RunOutput> {
    let family = config.sample.family;

    // 1) Generate the synthetic sample.
    let data = generate_sample(&config.sample)?;
    info!(n = data.n(), p = data.p(), family = ?family, "generated sample");

    // 2) Full-data path search.
    let search = path::run(&data, family, &config.search, fitter, progress)?;
    info!(models = search.n_models(), depths = search.frontiers().len(), "path search finished");

    let mut out = RunOutput {
        data,
        search,
        stability: None,
        plausible: None,
        best_fit: None,
        classification: None,
    };
    if stage == Stage::Search {
        return Ok(out);
    }

    // 3) Stability, unless the plausible stage was asked to skip it.
    let want_stability = stage == Stage::Stability || !config.skip_stability;
    if want_stability {
        let result = stability::run(&out.data, family, &config.stability, fitter, progress)?;
        info!(
            resamples = result.resamples(),
            failed = result.failed().len(),
            "stability estimated"
        );
        out.stability = Some(result);
    }
    if stage == Stage::Stability {
        return Ok(out);
    }

    // 4) Plausible shortlist.
    let refit = config.plausible.refit.then_some(Refit {
        data: &out.data,
        fitter,
    });
    let set = plausible::run(&out.search, out.stability.as_ref(), &config.plausible, refit)?;
    info!(models = set.len(), "plausible set built");

    // 5) Refit the top model and, for binomial data, summarize its classification.
    if let Some(best) = set.best() {
        let fit = match &best.fitted {
            Some(f) => f.clone(),
            None => fitter.fit(&out.data, &best.model.columns, family)?,
        };
        if family == Family::Binomial {
            let probabilities = fit.predict(&out.data)?;
            let labels = out.data.y().as_slice().to_vec();
            out.classification = Some(classify(&probabilities, &labels, config.class_threshold)?);
        }
        out.best_fit = Some(fit);
    }
    out.plausible = Some(set);

    Ok(out)
}
