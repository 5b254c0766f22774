use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ActorRole, AuditAction};

/// An append-only audit ledger entry recording a state-changing action.
///
/// `seq` is assigned by the ledger and is the ordering guarantee for
/// compliance queries; `timestamp` is informational only, so clock skew
/// can never reorder the trail.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub seq: i64,
    pub timestamp: DateTime<Utc>,
    pub actor_role: ActorRole,
    pub actor_id: String,
    pub action: AuditAction,
    pub scan_id: String,
}
