use chrono::{DateTime, Utc};

use csl_core::enums::Role;
use csl_core::identity::Identity;

/// Parsed and verified credential claims.
///
/// Produced by [`crate::token::resolve`], consumed by the CLI and any
/// other host layer. Convert to the lightweight [`Identity`] before
/// calling into the service.
#[derive(Debug, Clone)]
pub struct Claims {
    /// Raw credential string, kept for onward passing.
    pub raw_token: String,
    /// Subject user id.
    pub user_id: String,
    /// Resolved role.
    pub role: Role,
    /// Expiry instant (from the `exp` claim).
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Convert to the identity shape the service operations take.
    #[must_use]
    pub fn to_identity(&self) -> Identity {
        Identity::new(self.user_id.clone(), self.role)
    }
}
