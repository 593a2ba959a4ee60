//! The selection core.
//!
//! - `path`: multi-path forward search scored by AIC
//! - `stability`: resampled reruns of the search, aggregated per predictor
//! - `plausible`: AIC window + stability + near-duplicate filter over one search
//! - `progress`: optional event stream shared by all three

pub mod path;
pub mod plausible;
pub mod progress;
pub mod stability;

pub use path::{Frontier, PathSearchResult, SearchMeta};
pub use plausible::{PlausibleEntry, PlausibleModelSet, Refit};
pub use progress::{Progress, ProgressEvent};
pub use stability::{StabilityResult, StabilitySummary};
