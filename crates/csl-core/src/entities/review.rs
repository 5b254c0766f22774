use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Confidence, ConditionTier1, ReviewStatus};

/// One doctor's review of one scan. Keyed by `(scan_id, doctor_id)`.
///
/// Created implicitly on the first draft save with the default shape from
/// [`ReviewRecord::empty_draft`]. Status transitions are the only
/// mutations; once the record leaves `draft`, every field is frozen.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReviewRecord {
    pub scan_id: String,
    pub doctor_id: String,
    pub status: ReviewStatus,
    pub condition_tier1: Option<ConditionTier1>,
    pub confidence_level: Option<Confidence>,
    pub notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// The documented default initial state: an empty draft.
    ///
    /// Returned to a doctor who has not saved anything yet, and used as the
    /// insert shape on first save.
    #[must_use]
    pub const fn empty_draft(scan_id: String, doctor_id: String, now: DateTime<Utc>) -> Self {
        Self {
            scan_id,
            doctor_id,
            status: ReviewStatus::Draft,
            condition_tier1: None,
            confidence_level: None,
            notes: None,
            submitted_at: None,
            locked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Names of required fields that are still empty. Submit is refused
    /// while this is non-empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.condition_tier1.is_none() {
            missing.push("condition_tier1");
        }
        if self.confidence_level.is_none() {
            missing.push("confidence_level");
        }
        missing
    }

    /// Whether a draft save with `fields` would change anything.
    #[must_use]
    pub fn differs_from(&self, fields: &DraftFields) -> bool {
        self.condition_tier1 != fields.condition_tier1
            || self.confidence_level != fields.confidence_level
            || self.notes != fields.notes
    }
}

/// The editable subset of a review, as supplied by a draft save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DraftFields {
    pub condition_tier1: Option<ConditionTier1>,
    pub confidence_level: Option<Confidence>,
    pub notes: Option<String>,
}
