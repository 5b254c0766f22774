//! Credential verification configuration.

use serde::{Deserialize, Serialize};

/// Default credential lifetime: one working shift.
const fn default_token_ttl_secs() -> i64 {
    8 * 60 * 60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Shared secret the external authenticator signs credentials with.
    #[serde(default)]
    pub token_secret: String,

    /// Lifetime applied to locally minted credentials, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Whether credential verification can run.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token_secret.is_empty()
    }
}
