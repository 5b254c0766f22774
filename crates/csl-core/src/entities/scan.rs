use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A scan ingested from the external imaging system.
///
/// Immutable once ingested. The image itself is hosted externally;
/// `image_ref` is an opaque handle and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Scan {
    pub scan_id: String,
    pub source_user_id: String,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}
