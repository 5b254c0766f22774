//! The access gate.
//!
//! Two orthogonal rules, evaluated before any operation reads or mutates
//! state:
//!
//! 1. **Blinding** — a doctor only ever reaches the review record keyed by
//!    their own user id; other doctors' reviews, the assistive output, the
//!    final aggregate, and the audit ledger are off limits regardless of
//!    scan completeness.
//! 2. **Admin read-only** — an admin reads scan lists, the per-scan bundle
//!    once complete, and the audit ledger, but has no write operation.
//!
//! The role is a fixed tagged variant checked here, once, rather than
//! re-checked ad hoc at every call site. Possession of an [`Identity`]
//! already proves authentication; callers without a resolvable identity
//! fail in `csl-auth` before any of these checks run.

use crate::enums::Role;
use crate::errors::ReviewError;
use crate::identity::Identity;

/// Gate for doctor-only operations (draft save, submit, own-review reads).
///
/// # Errors
///
/// Returns `ReviewError::Forbidden` unless the caller is a doctor.
pub const fn require_doctor(identity: &Identity) -> Result<(), ReviewError> {
    match identity.role {
        Role::Doctor => Ok(()),
        Role::Admin => Err(ReviewError::Forbidden),
    }
}

/// Gate for admin-only read paths (scan list, final bundle, audit ledger).
///
/// # Errors
///
/// Returns `ReviewError::Forbidden` unless the caller is an admin.
pub const fn require_admin(identity: &Identity) -> Result<(), ReviewError> {
    match identity.role {
        Role::Admin => Ok(()),
        Role::Doctor => Err(ReviewError::Forbidden),
    }
}

/// Blinding gate for a review read addressed by doctor id: a doctor may
/// only name themselves. Admins do not read individual reviews through
/// this path — they get the full bundle once the scan is complete.
///
/// # Errors
///
/// Returns `ReviewError::Forbidden` for admins and for doctors naming
/// anyone but themselves.
pub fn require_review_owner(identity: &Identity, doctor_id: &str) -> Result<(), ReviewError> {
    require_doctor(identity)?;
    if identity.user_id == doctor_id {
        Ok(())
    } else {
        Err(ReviewError::Forbidden)
    }
}
