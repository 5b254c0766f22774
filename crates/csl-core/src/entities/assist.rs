use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Assistive AI output for a scan. Produced by an external pipeline,
/// stored exactly once, never authoritative. Visible only to admins,
/// and only once the scan's review set is complete.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssistiveOutput {
    pub scan_id: String,
    pub output_text: String,
    pub executed_at: DateTime<Utc>,
}
