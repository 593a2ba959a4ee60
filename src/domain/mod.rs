//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run-wide enums (`Family`, `ResampleKind`)
//! - the candidate `Model` record and its canonical id
//! - parameter structs for each component (`SearchParams`, `StabilityParams`,
//!   `PlausibleParams`) and the CLI-level `RunConfig`

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
