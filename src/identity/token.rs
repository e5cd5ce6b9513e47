//! Bearer token carried by the authenticating edge.

use std::fmt;

use axum::http::{HeaderMap, HeaderName};

/// Header the authenticating edge uses to pass the user's access token.
pub const X_FORWARDED_ACCESS_TOKEN: HeaderName =
    HeaderName::from_static("x-forwarded-access-token");

/// An opaque, non-empty bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token. Returns `None` for an empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Read the forwarded access token from a request's headers.
    ///
    /// Absent, empty and non-UTF-8 values all yield `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(&X_FORWARDED_ACCESS_TOKEN)?;
        match value.to_str() {
            Ok(raw) => Self::new(raw),
            Err(_) => {
                tracing::warn!("Ignoring access token header with non-UTF-8 value");
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_absent_and_empty_tokens() {
        let mut headers = HeaderMap::new();
        assert!(BearerToken::from_headers(&headers).is_none());

        headers.insert(X_FORWARDED_ACCESS_TOKEN, HeaderValue::from_static(""));
        assert!(BearerToken::from_headers(&headers).is_none());
    }

    #[test]
    fn test_present_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-forwarded-access-token"),
            HeaderValue::from_static("tok-valid"),
        );
        let token = BearerToken::from_headers(&headers).unwrap();
        assert_eq!(token.as_str(), "tok-valid");
    }

    #[test]
    fn test_non_utf8_token_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_ACCESS_TOKEN,
            HeaderValue::from_bytes(b"tok-\xff").unwrap(),
        );
        assert!(BearerToken::from_headers(&headers).is_none());
    }

    #[test]
    fn test_debug_redacts() {
        let token = BearerToken::new("secret").unwrap();
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
