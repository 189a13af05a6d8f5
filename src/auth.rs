//! Credential injection for outbound requests.
//!
//! A pure function of the configured token: every request carries a JSON
//! content type, plus a bearer Authorization header iff a token is set.
//! There is no refresh logic; a stale token surfaces through the 401 path.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::ConfigError;

/// Build the default header set for the configured credential.
///
/// # Errors
///
/// Returns `ConfigError::InvalidToken` if the token cannot be encoded as an
/// HTTP header value.
pub fn auth_headers(token: Option<&str>) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ConfigError::InvalidToken)?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}
