use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::FinalResult;

/// Number of locked reviews required before a scan's result set is
/// visible. Fixed: every scan is assessed by exactly three doctors.
pub const QUORUM: u32 = 3;

/// The immutable aggregate frozen at the moment the third review locks.
///
/// Computed exactly once per scan; depends only on the three locked
/// reviews (and, for display, the assistive output stored alongside).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FinalAggregate {
    pub scan_id: String,
    pub result: FinalResult,
    pub agreement_summary: String,
    pub generated_at: DateTime<Utc>,
}

/// Progress of a scan's review set toward quorum.
///
/// The denominator is always [`QUORUM`]; the numerator is the count of
/// locked reviews. Displays as `"1/3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCompletion {
    pub locked: u32,
}

impl ReviewCompletion {
    #[must_use]
    pub const fn new(locked: u32) -> Self {
        Self { locked }
    }

    /// Whether quorum has been reached.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.locked >= QUORUM
    }
}

impl fmt::Display for ReviewCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{QUORUM}", self.locked)
    }
}
