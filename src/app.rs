//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - generates the synthetic sample
//! - runs search, stability and the plausible filter
//! - prints tables or a JSON report

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, RunArgs};
use crate::domain::{PlausibleParams, RunConfig, SampleConfig, SearchParams, StabilityParams};
use crate::error::{Result, SelectError};
use crate::search::{Progress, ProgressEvent};

pub mod pipeline;

use pipeline::{RunOutput, Stage};

/// Entry point for the `mpaic` binary.
pub fn run() -> Result<()> {
    let cli = crate::cli::Cli::parse();
    init_logging();

    match cli.command {
        Command::Search(args) => handle(args, Stage::Search),
        Command::Stability(args) => handle(args, Stage::Stability),
        Command::Plausible(args) => handle(args, Stage::Plausible),
    }
}

/// Log to stderr so stdout stays clean for tables and JSON. `RUST_LOG` overrides
/// the default `warn` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle(args: RunArgs, stage: Stage) -> Result<()> {
    let config = run_config_from_args(&args)?;
    let progress = if config.progress {
        Progress::new(print_progress)
    } else {
        Progress::none()
    };

    let run = pipeline::run_pipeline(&config, stage, &progress)?;

    if config.json {
        println!("{}", run.to_report(&config).to_json()?);
    } else {
        print_tables(&run, stage, args.top);
    }
    Ok(())
}

fn print_tables(run: &RunOutput, stage: Stage, top: usize) {
    match stage {
        Stage::Search => println!("{}", crate::report::format_search(&run.search, top)),
        Stage::Stability => {
            if let Some(stability) = &run.stability {
                println!("{}", crate::report::format_stability(stability));
            }
        }
        Stage::Plausible => {
            if let Some(stability) = &run.stability {
                println!("{}", crate::report::format_stability(stability));
            }
            if let Some(set) = &run.plausible {
                println!("{}", crate::report::format_plausible(set));
            }
            if let Some(fit) = &run.best_fit {
                println!("{}", crate::report::format_fitted(fit));
            }
            if let Some(report) = &run.classification {
                println!("{}", crate::report::format_classification(report));
            }
        }
    }
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::SearchStarted { predictors, max_depth } => {
            eprintln!("search: {predictors} predictors, max depth {max_depth}");
        }
        ProgressEvent::DepthCompleted {
            depth,
            candidates,
            retained,
            best_score,
        } => {
            eprintln!("  depth {depth}: {retained}/{candidates} kept, best AIC {best_score:.3}");
        }
        ProgressEvent::SearchStopped { depth } => {
            eprintln!("  stopped at depth {depth}: no improving child");
        }
        ProgressEvent::ResampleFinished { index, total, ok } => {
            let status = if *ok { "ok" } else { "failed" };
            eprintln!("resample {}/{total} {status}", index + 1);
        }
    }
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig> {
    let search = SearchParams {
        max_depth: args.max_depth,
        eps: args.eps,
        delta: args.delta,
        max_models: args.max_models,
    };

    Ok(RunConfig {
        sample: SampleConfig {
            n: args.n,
            p: args.p,
            family: args.family,
            signal: parse_signal(&args.signal)?,
            intercept: args.intercept,
            noise_sd: args.noise,
            seed: args.seed,
        },
        stability: StabilityParams {
            resamples: args.resamples,
            kind: args.resample,
            subsample_size: args.subsample_size,
            seed: args.resample_seed,
            workers: args.workers,
            search: search.clone(),
        },
        search,
        plausible: PlausibleParams {
            delta_aic: args.delta_aic,
            min_stability: args.min_stability,
            remove_duplicates: !args.keep_duplicates,
            jaccard_threshold: args.jaccard,
            refit: args.refit,
        },
        skip_stability: args.no_stability,
        class_threshold: args.threshold,
        json: args.json,
        progress: args.progress,
    })
}

/// Parse `name=coef` pairs separated by commas. An empty string means no signal.
pub fn parse_signal(raw: &str) -> Result<Vec<(String, f64)>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, value)) = part.split_once('=') else {
            return Err(SelectError::invalid(format!(
                "Signal term '{part}' must look like name=coefficient."
            )));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(SelectError::invalid(format!("Signal term '{part}' has no name.")));
        }
        let value: f64 = value.trim().parse().map_err(|_| {
            SelectError::invalid(format!("Signal coefficient '{}' is not a number.", value.trim()))
        })?;
        if out.iter().any(|(n, _): &(String, f64)| n == name) {
            return Err(SelectError::invalid(format!("Signal names '{name}' twice.")));
        }
        out.push((name.to_string(), value));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["mpaic", "plausible"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Plausible(a) => a,
            _ => unreachable!(),
        }
    }

    #[test]
    fn signal_parses_pairs() {
        let s = parse_signal("x1=1.0, x2=-0.5").unwrap();
        assert_eq!(s, vec![("x1".to_string(), 1.0), ("x2".to_string(), -0.5)]);
        assert!(parse_signal("").unwrap().is_empty());
    }

    #[test]
    fn signal_rejects_malformed_terms() {
        assert!(parse_signal("x1").is_err());
        assert!(parse_signal("=1").is_err());
        assert!(parse_signal("x1=abc").is_err());
        assert!(parse_signal("x1=1,x1=2").is_err());
    }

    #[test]
    fn config_forwards_search_params_to_stability() {
        let config = run_config_from_args(&args(&["-K", "4", "--delta", "0.5", "--keep-duplicates"])).unwrap();
        assert_eq!(config.search.max_depth, Some(4));
        assert_eq!(config.stability.search, config.search);
        assert!(!config.plausible.remove_duplicates);
        assert_eq!(config.class_threshold, 0.5);
    }
}
