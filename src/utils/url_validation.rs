//! URL validation for the bootstrap `callUrl` field
//!
//! The relay never fetches the call-source URL; it is stored for correlation
//! only. Validation therefore checks well-formedness, scheme, and host
//! presence without resolving the name.

use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// Validate that a call-source URL is well-formed.
///
/// Accepts http and https URLs with a non-empty host. Returns the parsed
/// URL so callers can log the normalized form.
pub fn validate_call_url(raw: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        let url = validate_call_url("https://example.com/calls/42").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_valid_http_url() {
        assert!(validate_call_url("http://pbx.internal/call").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        let result = validate_call_url("ftp://example.com/file");
        assert!(matches!(result, Err(UrlValidationError::UnsupportedScheme(_))));

        let result = validate_call_url("sip:alice@example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            validate_call_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_missing_host() {
        assert!(validate_call_url("http:///path-only").is_err());
    }
}
