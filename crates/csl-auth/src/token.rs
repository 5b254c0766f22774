//! Signed credential encoding and verification.
//!
//! Format: `base64url(payload) "." base64url(sha256(secret || "." || payload))`
//! where the payload is a compact JSON object carrying `sub`, `role`, and
//! `exp` (unix seconds). The signature binds the payload to the shared
//! secret; any byte change in either part fails verification.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use csl_core::enums::Role;

use crate::claims::Claims;
use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String,
    role: Role,
    exp: i64,
}

fn signature(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload);
    hasher.finalize().to_vec()
}

/// Mint a signed credential for `user_id` with the given role and
/// lifetime. Stand-in for the external authenticator, used by the CLI
/// and tests.
#[must_use]
pub fn mint(user_id: &str, role: Role, secret: &str, ttl_secs: i64) -> String {
    let payload = TokenPayload {
        sub: user_id.to_string(),
        role,
        exp: (Utc::now() + TimeDelta::seconds(ttl_secs)).timestamp(),
    };
    // Serializing a struct of strings and ints cannot fail.
    let json = serde_json::to_vec(&payload).expect("token payload serializes");
    let sig = signature(secret, &json);
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&json),
        URL_SAFE_NO_PAD.encode(sig)
    )
}

/// Verify a credential and extract its claims.
///
/// # Errors
///
/// - `MissingCredential` for an empty token
/// - `Malformed` when the token does not parse as payload.signature
/// - `InvalidSignature` when the signature does not match the payload
/// - `Expired` when `exp` is in the past
pub fn resolve(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let (payload_b64, sig_b64) = token
        .split_once('.')
        .ok_or_else(|| AuthError::Malformed("expected payload.signature".into()))?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| AuthError::Malformed(format!("payload: {e}")))?;
    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|e| AuthError::Malformed(format!("signature: {e}")))?;

    if signature(secret, &payload) != sig {
        tracing::debug!("credential rejected: signature mismatch");
        return Err(AuthError::InvalidSignature);
    }

    let parsed: TokenPayload = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::Malformed(format!("claims: {e}")))?;

    let expires_at = DateTime::from_timestamp(parsed.exp, 0)
        .ok_or_else(|| AuthError::Malformed("invalid exp timestamp".into()))?;
    if expires_at <= Utc::now() {
        tracing::debug!(user_id = %parsed.sub, "credential rejected: expired");
        return Err(AuthError::Expired);
    }

    Ok(Claims {
        raw_token: token.to_string(),
        user_id: parsed.sub,
        role: parsed.role,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn mint_then_resolve_roundtrip() {
        let token = mint("DOCTOR-1", Role::Doctor, SECRET, 3600);
        let claims = resolve(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, "DOCTOR-1");
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.raw_token, token);
        assert!(claims.expires_at > Utc::now());
    }

    #[test]
    fn admin_role_survives_roundtrip() {
        let token = mint("ADMIN-1", Role::Admin, SECRET, 3600);
        let claims = resolve(&token, SECRET).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn empty_token_is_missing_credential() {
        assert!(matches!(
            resolve("", SECRET),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert!(matches!(
            resolve("not-a-token", SECRET),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            resolve("!!!.###", SECRET),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let token = mint("DOCTOR-1", Role::Doctor, SECRET, 3600);
        assert!(matches!(
            resolve(&token, "other-secret"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let token = mint("DOCTOR-1", Role::Doctor, SECRET, 3600);
        let forged_payload = URL_SAFE_NO_PAD
            .encode(r#"{"sub":"DOCTOR-1","role":"admin","exp":9999999999}"#);
        let sig = token.split_once('.').unwrap().1;
        let forged = format!("{forged_payload}.{sig}");
        assert!(matches!(
            resolve(&forged, SECRET),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = mint("DOCTOR-1", Role::Doctor, SECRET, -60);
        assert!(matches!(resolve(&token, SECRET), Err(AuthError::Expired)));
    }
}
