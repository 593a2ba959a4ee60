//! Command-line parsing for the multi-path AIC selector.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the search code.

use clap::{Args, Parser, Subcommand};

use crate::domain::{Family, ResampleKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mpaic",
    version,
    about = "Multi-path forward AIC variable selection on synthetic regression data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
///
/// All three generate the same synthetic sample and run the path search; they
/// differ in how far down the pipeline they go.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the multi-path forward search and print every depth's models.
    Search(RunArgs),
    /// Estimate per-predictor selection stability by resampling.
    Stability(RunArgs),
    /// Search, estimate stability, and print the plausible-model shortlist.
    Plausible(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Number of observations to generate.
    #[arg(short = 'n', long = "n", default_value_t = 200)]
    pub n: usize,

    /// Number of candidate predictors (named x1..xp).
    #[arg(short = 'p', long = "p", default_value_t = 5)]
    pub p: usize,

    /// Response family.
    #[arg(long, value_enum, default_value_t = Family::Gaussian)]
    pub family: Family,

    /// True coefficients, e.g. `x1=1.0,x2=0.5`. Unlisted predictors are pure noise.
    #[arg(long, default_value = "x1=1.0,x2=0.5")]
    pub signal: String,

    /// True intercept.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub intercept: f64,

    /// Noise standard deviation (gaussian only).
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    /// Random seed for data generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum search depth K (default: min(p, 10)).
    #[arg(short = 'K', long)]
    pub max_depth: Option<usize>,

    /// Minimum AIC improvement for a parent to expand.
    #[arg(long, default_value_t = 1e-6)]
    pub eps: f64,

    /// AIC window for keeping near-best children of a parent.
    #[arg(long, default_value_t = 1.0)]
    pub delta: f64,

    /// Maximum models retained per depth (L).
    #[arg(short = 'L', long, default_value_t = 50)]
    pub max_models: usize,

    /// Number of stability resamples (B).
    #[arg(short = 'B', long, default_value_t = 50)]
    pub resamples: usize,

    /// Resampling scheme for stability.
    #[arg(long, value_enum, default_value_t = ResampleKind::Bootstrap)]
    pub resample: ResampleKind,

    /// Rows per subsample (default: ceil(sqrt(n))).
    #[arg(long)]
    pub subsample_size: Option<usize>,

    /// Base seed for resampling.
    #[arg(long, default_value_t = 42)]
    pub resample_seed: u64,

    /// Worker threads for resampling (default: all cores).
    #[arg(long)]
    pub workers: Option<usize>,

    /// AIC window around the overall best model for the shortlist.
    #[arg(long, default_value_t = 2.0)]
    pub delta_aic: f64,

    /// Minimum average stability of a shortlisted model.
    #[arg(long, default_value_t = 0.6)]
    pub min_stability: f64,

    /// Keep near-duplicate models in the shortlist.
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Jaccard similarity at or above which two models are near-duplicates.
    #[arg(long, default_value_t = 0.9)]
    pub jaccard: f64,

    /// Refit every shortlisted model on the full data.
    #[arg(long)]
    pub refit: bool,

    /// Skip stability; filter the shortlist on AIC alone.
    #[arg(long)]
    pub no_stability: bool,

    /// Probability threshold for the binomial classification summary.
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,

    /// Models shown per depth in the search listing.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print the run report as JSON instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Print progress events to stderr.
    #[arg(long)]
    pub progress: bool,
}
