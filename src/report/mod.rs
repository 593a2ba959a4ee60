//! Reporting: terminal text, the JSON run report and classification metrics.

pub mod format;
pub mod metrics;

pub use format::*;
pub use metrics::{ClassificationReport, ConfusionMatrix, classify};

use serde::Serialize;

use crate::domain::RunConfig;
use crate::error::{Result, SelectError};
use crate::search::{PathSearchResult, PlausibleModelSet, StabilitySummary};

/// Everything a single CLI run computed, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: RunConfig,
    pub search: PathSearchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<StabilitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plausible: Option<PlausibleModelSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationReport>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SelectError::Serialize(e.to_string()))
    }
}
