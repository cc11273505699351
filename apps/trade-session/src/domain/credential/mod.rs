//! Session Credential
//!
//! The short-lived access token issued by the gateway's `Auth` RPC and the
//! pure decoding of its embedded claims.
//!
//! # Token Format
//!
//! Tokens are JWT-shaped: `header.payload.signature`, where the payload is a
//! base64url-encoded JSON claim set. Only the `exp` claim (unix seconds) is
//! read. The signature is never verified on the client side.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced while decoding token claims.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Token does not have exactly three dot-separated segments.
    #[error("invalid token format: expected 3 segments, got {0}")]
    SegmentCount(usize),

    /// Payload segment is not valid base64url (padded or unpadded).
    #[error("failed to decode payload: {0}")]
    Base64(String),

    /// Payload is not a JSON claim set.
    #[error("failed to unmarshal claims: {0}")]
    Claims(String),

    /// `exp` claim is absent or zero.
    #[error("exp claim missing")]
    MissingExpiry,

    /// `exp` claim is outside the representable time range.
    #[error("exp claim out of range: {0}")]
    ExpiryOutOfRange(i64),
}

// =============================================================================
// Access Token
// =============================================================================

/// Opaque access token attached to every authenticated gateway call.
///
/// `Debug` never prints the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value, for transport metadata only.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

// =============================================================================
// Credential
// =============================================================================

/// An issued access token together with its expiry.
///
/// Immutable once issued; renewal replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential from a token and its expiry.
    #[must_use]
    pub const fn new(token: AccessToken, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// The access token.
    #[must_use]
    pub const fn token(&self) -> &AccessToken {
        &self.token
    }

    /// When the token stops being accepted by the gateway.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// =============================================================================
// Claims Decoding
// =============================================================================

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the base64url payload segment of a token.
///
/// Tries the unpadded alphabet first, then pads to a multiple of four and
/// retries with the padded alphabet.
///
/// # Errors
///
/// Returns [`DecodeError::Base64`] when neither alphabet accepts the input.
pub fn decode_payload(segment: &str) -> Result<Vec<u8>, DecodeError> {
    if let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment) {
        return Ok(bytes);
    }

    let mut padded = segment.to_string();
    let remainder = padded.len() % 4;
    if remainder > 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

/// Parse a decoded claim set and return its `exp` claim.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object or `exp` is absent,
/// zero, or not representable as a timestamp.
pub fn expiry_from_claims(bytes: &[u8]) -> Result<DateTime<Utc>, DecodeError> {
    let claims: Claims =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Claims(e.to_string()))?;

    match claims.exp {
        None | Some(0) => Err(DecodeError::MissingExpiry),
        Some(exp) => {
            DateTime::from_timestamp(exp, 0).ok_or(DecodeError::ExpiryOutOfRange(exp))
        }
    }
}

/// Extract the expiry timestamp embedded in a token's claims.
///
/// # Errors
///
/// Fails when the token does not have three segments or its payload cannot
/// be decoded into a claim set carrying a non-zero `exp`.
pub fn claims_expiry(token: &str) -> Result<DateTime<Utc>, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = decode_payload(segments[1])?;
    expiry_from_claims(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

    fn token_with_payload(payload: &str) -> String {
        format!("{HEADER}.{payload}.dummy_sig")
    }

    #[test]
    fn expiry_from_unpadded_payload() {
        let exp = 1_767_225_600_i64;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        let token = token_with_payload(&payload);

        let expiry = claims_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), exp);
    }

    #[test]
    fn expiry_from_padded_payload() {
        // 14-byte payload encodes to 20 chars with two '=' of padding
        let payload = URL_SAFE.encode(r#"{"exp":123456}"#);
        assert!(payload.ends_with('='));
        let token = token_with_payload(&payload);

        let expiry = claims_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 123_456);
    }

    #[test_case("invalid-token", 1 ; "single segment")]
    #[test_case("a.b", 2 ; "two segments")]
    #[test_case("a.b.c.d", 4 ; "four segments")]
    fn wrong_segment_count_fails(token: &str, count: usize) {
        assert_eq!(claims_expiry(token), Err(DecodeError::SegmentCount(count)));
    }

    #[test]
    fn malformed_payload_fails() {
        let token = token_with_payload("bad-base64");
        assert!(claims_expiry(&token).is_err());
    }

    #[test]
    fn non_json_payload_fails() {
        let payload = URL_SAFE_NO_PAD.encode("not json");
        let result = claims_expiry(&token_with_payload(&payload));
        assert!(matches!(result, Err(DecodeError::Claims(_))));
    }

    #[test_case(r#"{"sub":"user"}"# ; "absent")]
    #[test_case(r#"{"exp":0}"# ; "zero")]
    fn missing_expiry_fails(claims: &str) {
        let payload = URL_SAFE_NO_PAD.encode(claims);
        let result = claims_expiry(&token_with_payload(&payload));
        assert_eq!(result, Err(DecodeError::MissingExpiry));
    }

    #[test]
    fn credential_expiry_check() {
        let expires_at = DateTime::from_timestamp(1_000, 0).unwrap();
        let credential = Credential::new(AccessToken::new("t"), expires_at);

        assert!(!credential.is_expired_at(DateTime::from_timestamp(999, 0).unwrap()));
        assert!(credential.is_expired_at(expires_at));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    proptest! {
        #[test]
        fn padded_and_unpadded_payloads_agree(
            exp in 1_i64..4_000_000_000,
            subject in "[a-z]{0,7}",
        ) {
            let claims = format!(r#"{{"sub":"{subject}","exp":{exp}}}"#);
            let unpadded = token_with_payload(&URL_SAFE_NO_PAD.encode(&claims));
            let padded = token_with_payload(&URL_SAFE.encode(&claims));

            prop_assert_eq!(claims_expiry(&unpadded).unwrap().timestamp(), exp);
            prop_assert_eq!(claims_expiry(&padded).unwrap().timestamp(), exp);
        }
    }
}
