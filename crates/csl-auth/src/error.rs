use csl_core::errors::ReviewError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential signature mismatch")]
    InvalidSignature,

    #[error("credential expired")]
    Expired,
}

/// Every auth failure surfaces as the `Unauthenticated` taxon — the
/// caller is told to log in again, nothing more.
impl From<AuthError> for ReviewError {
    fn from(_: AuthError) -> Self {
        Self::Unauthenticated
    }
}
