//! HS256 JSON Web Tokens.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base64url of `{"alg":"HS256","typ":"JWT"}`.
const HEADER_B64: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies session tokens with one shared secret.
pub struct TokenSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, unix_now())
    }

    pub fn issue_at(&self, user_id: &str, email: &str, issued_at: u64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl.as_secs()),
        };
        let payload = serde_json::to_vec(&claims).map_err(|e| TokenError::Encode(e.to_string()))?;

        let signing_input = format!("{HEADER_B64}.{}", URL_SAFE_NO_PAD.encode(payload));
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref())))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input_len = token.len() - signature_segment_len(token);
        hmac::verify(
            &self.key,
            &token.as_bytes()[..signing_input_len],
            &signature,
        )
        .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = decode_segment(payload)?;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Length of `.<signature>` at the end of a three-segment token.
fn signature_segment_len(token: &str) -> usize {
    token.rfind('.').map_or(0, |idx| token.len() - idx)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret", WEEK)
    }

    #[test]
    fn header_constant_matches_hs256() {
        let decoded = URL_SAFE_NO_PAD.decode(HEADER_B64).unwrap();
        assert_eq!(decoded, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn issued_tokens_verify_with_seven_day_expiry() {
        let token = signer().issue_at("u1", "a@b.c", 1_000).unwrap();
        let claims = signer().verify_at(&token, 1_001).unwrap();
        assert_eq!(
            claims,
            Claims {
                sub: "u1".into(),
                email: "a@b.c".into(),
                iat: 1_000,
                exp: 1_000 + 604_800,
            }
        );
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = signer().issue_at("u1", "a@b.c", 1_000).unwrap();
        assert_eq!(
            signer().verify_at(&token, 1_000 + 604_800),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenSigner::new(b"other", WEEK)
            .issue_at("u1", "a@b.c", 1_000)
            .unwrap();
        assert_eq!(
            signer().verify_at(&token, 1_001),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = signer().issue_at("u1", "a@b.c", 1_000).unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            br#"{"sub":"admin","email":"a@b.c","iat":1000,"exp":99999999999}"#,
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_claims;
        assert_eq!(
            signer().verify_at(&parts.join("."), 1_001),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.!!.!!"] {
            assert_eq!(signer().verify_at(token, 0), Err(TokenError::Malformed), "{token:?}");
        }
    }

    #[test]
    fn none_algorithm_is_refused() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"u","email":"e","iat":0,"exp":10}"#);
        assert_eq!(
            signer().verify_at(&format!("{header}.{claims}."), 1),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }
}
