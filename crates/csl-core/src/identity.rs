use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Authenticated caller identity for cross-crate passing.
///
/// Produced by `csl-auth` from a signed credential, consumed by every
/// service operation. Contains only data fields — no verification logic.
/// The core holds no session state; an `Identity` is supplied explicitly
/// with each call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id from the credential's subject claim.
    pub user_id: String,
    /// Resolved role. Checked once at the access gate.
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub const fn new(user_id: String, role: Role) -> Self {
        Self { user_id, role }
    }
}
