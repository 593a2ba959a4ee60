//! Input data: the validated `Dataset` and the synthetic sample generator.

pub mod dataset;
pub mod sample;

pub use dataset::Dataset;
pub use sample::{generate_sample, predictor_names};
