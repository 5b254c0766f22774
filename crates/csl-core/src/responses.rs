//! Read-side bundles returned by the admin-facing paths.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{AssistiveOutput, FinalAggregate, ReviewRecord, Scan};

/// One row of the admin scan list: the scan plus its progress toward
/// quorum.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScanSummary {
    pub scan: Scan,
    /// Rendered `"locked/3"`.
    pub review_completion: String,
    pub is_complete: bool,
}

/// The per-scan bundle served to admins.
///
/// Before quorum, `reviews` is empty and `ai`/`final` are absent: nothing
/// about the in-progress panel is exposed, only the completion counter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FinalBundle {
    pub scan: Scan,
    pub reviews: Vec<ReviewRecord>,
    pub ai: Option<AssistiveOutput>,
    #[serde(rename = "final")]
    pub final_aggregate: Option<FinalAggregate>,
    pub is_complete: bool,
    /// Rendered `"locked/3"`.
    pub review_completion: String,
}
