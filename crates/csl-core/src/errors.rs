//! The error taxonomy surfaced to callers of the review engine.
//!
//! Every failure carries enough structure (kind plus optional field
//! names) for the consuming layer to render a precise message. The core
//! never retries internally; `Unavailable` is the only retryable kind.

use thiserror::Error;

/// Errors returned by review engine operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// No credential, or the credential is malformed, tampered, or
    /// expired. Surfaced as a forced re-login.
    #[error("not authenticated")]
    Unauthenticated,

    /// Role or ownership violation. The message never reveals whether the
    /// requested record exists.
    #[error("access denied")]
    Forbidden,

    /// A submit was attempted with required fields still empty.
    #[error("missing required field(s): {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    /// An edit was attempted on a record that is no longer a draft.
    /// Callers treat this as a no-op: the store returns the existing
    /// record unchanged rather than propagating this as a failure.
    #[error("review for scan {scan_id} is no longer editable")]
    Conflict { scan_id: String },

    /// Entity lookup returned no result.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage failure. Retryable by the caller; the core never retries.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl ReviewError {
    /// Build a validation error from the missing field names.
    #[must_use]
    pub fn missing(fields: &[&'static str]) -> Self {
        Self::Validation {
            fields: fields.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether the caller may retry the operation verbatim.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_names_all_missing_fields() {
        let err = ReviewError::missing(&["condition_tier1", "confidence_level"]);
        assert_eq!(
            err.to_string(),
            "missing required field(s): condition_tier1, confidence_level"
        );
    }

    #[test]
    fn forbidden_does_not_leak_detail() {
        assert_eq!(ReviewError::Forbidden.to_string(), "access denied");
    }

    #[test]
    fn conflict_names_the_scan() {
        let err = ReviewError::Conflict {
            scan_id: "SCN-1".into(),
        };
        assert_eq!(err.to_string(), "review for scan SCN-1 is no longer editable");
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(ReviewError::Unavailable("io".into()).is_retryable());
        assert!(!ReviewError::Forbidden.is_retryable());
        assert!(!ReviewError::Unauthenticated.is_retryable());
        assert!(!ReviewError::missing(&["condition_tier1"]).is_retryable());
    }
}
