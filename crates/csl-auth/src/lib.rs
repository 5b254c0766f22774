//! # csl-auth
//!
//! The identity and role resolver for Consilium.
//!
//! Turns a signed opaque credential into `{role, user_id}` claims, or
//! fails when the credential is missing, malformed, tampered, or expired.
//! Purely a verification function — no session state lives here or
//! anywhere else in the core; the resolved [`csl_core::identity::Identity`]
//! is passed explicitly into every operation.
//!
//! Token issuance belongs to the external authenticator; [`token::mint`]
//! exists as its stand-in for the CLI and tests.

pub mod claims;
pub mod error;
pub mod token;

pub use claims::Claims;
pub use error::AuthError;
pub use token::{mint, resolve};
