//! Session identity for Papergate
//!
//! Requests carry a JWT bearer token minted by the external auth service.
//! Claims map the session to a user email and chain account; the privilege
//! level lives on the user record, not in the token. In dev mode a missing
//! token may be substituted by `X-User-Email` / `X-User-Account` headers.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{GatewayError, Result};

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier (account email)
    pub sub: String,
    /// Chain account address
    pub account: String,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issued at (seconds since epoch)
    pub iat: i64,
}

impl Claims {
    /// Mint a token for a session (used by dev tooling and tests)
    pub fn issue(email: &str, account: &str, secret: &str, expiry_seconds: u64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: email.to_string(),
            account: account.to_string(),
            exp: now + expiry_seconds as i64,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| GatewayError::Unauthorized(format!("token encoding failed: {}", e)))
    }

    /// Verify a token and return its claims
    pub fn verify(token: &str, secret: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| GatewayError::Unauthorized(format!("invalid token: {}", e)))
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_and_verify_roundtrip() {
        let token = Claims::issue("a@x.com", "0xA1", SECRET, 60).unwrap();
        let claims = Claims::verify(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.account, "0xA1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = Claims::issue("a@x.com", "0xA1", SECRET, 60).unwrap();
        assert!(Claims::verify(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "a@x.com".into(),
            account: "0xA1".into(),
            exp: now - 120,
            iat: now - 240,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(Claims::verify(&token, SECRET).is_err());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("Bearer "), None);
    }
}
