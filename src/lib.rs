//! `multipath-aic` library crate.
//!
//! Multi-path forward variable selection scored by AIC, with resampling
//! stability and a plausible-model filter on top.
//!
//! The binary (`mpaic`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the search can be driven with any [`fit::ModelFitter`]

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod report;
pub mod search;

pub use error::{FitFailure, Result, SelectError};
