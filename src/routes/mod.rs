//! HTTP routes for Papergate

pub mod health;
pub mod papers;

pub use health::{health_check, version_info};
pub use papers::{
    handle_add_reviewer, handle_details, handle_list, handle_update_rating, handle_upload,
};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::auth::{extract_bearer, Claims};
use crate::config::Args;
use crate::types::{GatewayError, Result};

/// Build a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Resolve the session identity for a request.
///
/// Production: a JWT bearer token. Dev mode additionally accepts
/// `X-User-Email` / `X-User-Account` headers when no valid token is
/// present.
pub fn authenticate(headers: &HeaderMap, args: &Args) -> Result<Claims> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer);

    if let Some(token) = token {
        match Claims::verify(token, &args.jwt_secret()) {
            Ok(claims) => return Ok(claims),
            Err(e) if !args.dev_mode => return Err(e),
            Err(_) => {}
        }
    } else if !args.dev_mode {
        return Err(GatewayError::Unauthorized(
            "missing bearer token".to_string(),
        ));
    }

    // Dev-mode header identity fallback
    let email = headers
        .get("x-user-email")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let account = headers
        .get("x-user-account")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match (email, account) {
        (Some(email), Some(account)) => Ok(Claims {
            sub: email,
            account,
            exp: 0,
            iat: 0,
        }),
        _ => Err(GatewayError::Unauthorized(
            "missing session identity".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn dev_args() -> Args {
        Args::parse_from([
            "papergate",
            "--contract-address",
            "0x1111111111111111111111111111111111111111",
            "--coinbase",
            "0x2222222222222222222222222222222222222222",
            "--coinbase-password",
            "pw",
            "--dev-mode",
        ])
    }

    #[test]
    fn bearer_token_identity() {
        let args = dev_args();
        let token = Claims::issue("a@x.com", "0xA1", &args.jwt_secret(), 60).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());

        let claims = authenticate(&headers, &args).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.account, "0xA1");
    }

    #[test]
    fn dev_mode_header_fallback() {
        let args = dev_args();
        let mut headers = HeaderMap::new();
        headers.insert("x-user-email", "a@x.com".parse().unwrap());
        headers.insert("x-user-account", "0xA1".parse().unwrap());

        let claims = authenticate(&headers, &args).unwrap();
        assert_eq!(claims.sub, "a@x.com");
    }

    #[test]
    fn production_requires_token() {
        let mut args = dev_args();
        args.dev_mode = false;
        args.jwt_secret = Some("secret".to_string());

        let mut headers = HeaderMap::new();
        headers.insert("x-user-email", "a@x.com".parse().unwrap());
        headers.insert("x-user-account", "0xA1".parse().unwrap());

        assert!(authenticate(&headers, &args).is_err());
    }
}
