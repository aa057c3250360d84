/// Authentication utilities for the optional inbound access token
use axum::http::{HeaderMap, header::AUTHORIZATION};
use subtle::ConstantTimeEq;

const BEARER_PREFIX: &str = "Bearer ";

/// A wrapper around String that uses constant-time equality comparison
/// to prevent timing attacks on access token validation.
#[derive(Clone)]
pub struct ConstantTimeString(String);

impl From<String> for ConstantTimeString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConstantTimeString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for ConstantTimeString {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for ConstantTimeString {}

// Never print the secret itself.
impl std::fmt::Debug for ConstantTimeString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConstantTimeString(<redacted>)")
    }
}

/// Validates a raw `Authorization` header value against the expected token.
///
/// The header must be exactly `Bearer <token>`: the scheme is case-sensitive and
/// exactly one space separates it from the token.
pub fn validate_bearer_header(expected: &ConstantTimeString, header: Option<&str>) -> bool {
    match header.and_then(|value| value.strip_prefix(BEARER_PREFIX)) {
        Some(token) => expected.eq(&ConstantTimeString::from(token)),
        None => false,
    }
}

/// Checks the request headers against the configured access token.
///
/// With no token configured every caller is allowed. A header that is not valid UTF-8 is
/// treated as missing.
pub fn is_authorized(access_token: Option<&ConstantTimeString>, headers: &HeaderMap) -> bool {
    let Some(expected) = access_token else {
        return true;
    };
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    validate_bearer_header(expected, header)
}
