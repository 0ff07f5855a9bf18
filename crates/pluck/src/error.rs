// ABOUTME: Error types for field extraction including ErrorCode enum and ExtractError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing different categories of extraction failures.
///
/// `Network`, `HttpStatus`, and `Timeout` are the fetch-failure family;
/// `Parse` covers content that cannot become a queryable document. A selector
/// that matches nothing is not an error at all (see `Extraction::NotFound`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Network,
    HttpStatus(u16),
    Timeout,
    Ssrf,
    Parse,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::InvalidUrl => write!(f, "invalid URL"),
            ErrorCode::Network => write!(f, "network error"),
            ErrorCode::HttpStatus(code) => write!(f, "HTTP status {}", code),
            ErrorCode::Timeout => write!(f, "timeout"),
            ErrorCode::Ssrf => write!(f, "SSRF blocked"),
            ErrorCode::Parse => write!(f, "parse error"),
        }
    }
}

/// The main error type for extract operations.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pluck: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::InvalidUrl,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Network error.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Network,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an HttpStatus error carrying the response status code.
    pub fn http_status(
        status: u16,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::HttpStatus(status),
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Timeout,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an SSRF error.
    pub fn ssrf(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Ssrf,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Parse error.
    pub fn parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Parse,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Network error.
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::Network
    }

    /// Returns true if this is an HttpStatus error.
    pub fn is_http_status(&self) -> bool {
        matches!(self.code, ErrorCode::HttpStatus(_))
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// The HTTP status code, if this is an HttpStatus error.
    pub fn status(&self) -> Option<u16> {
        match self.code {
            ErrorCode::HttpStatus(code) => Some(code),
            _ => None,
        }
    }

    /// Returns true if retrying could plausibly succeed: network failures,
    /// timeouts, and 5xx responses. Client errors (4xx) and everything the
    /// caller controls (invalid URL, SSRF) are permanent.
    pub fn is_transient(&self) -> bool {
        match self.code {
            ErrorCode::Network | ErrorCode::Timeout => true,
            ErrorCode::HttpStatus(code) => code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_url_and_code() {
        let err = ExtractError::http_status(503, "https://example.com/p", "Fetch", None);
        let s = err.to_string();
        assert!(s.contains("Fetch"));
        assert!(s.contains("https://example.com/p"));
        assert!(s.contains("HTTP status 503"));
    }

    #[test]
    fn display_includes_source_detail() {
        let err = ExtractError::network(
            "https://example.com",
            "Fetch",
            Some(anyhow::anyhow!("connection refused")),
        );
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn status_helper_only_for_http_status() {
        let err = ExtractError::http_status(404, "u", "Fetch", None);
        assert_eq!(err.status(), Some(404));
        assert!(err.is_http_status());

        let err = ExtractError::timeout("u", "Fetch", None);
        assert_eq!(err.status(), None);
        assert!(err.is_timeout());
    }

    #[test]
    fn transient_classification() {
        assert!(ExtractError::network("u", "Fetch", None).is_transient());
        assert!(ExtractError::timeout("u", "Fetch", None).is_transient());
        assert!(ExtractError::http_status(500, "u", "Fetch", None).is_transient());
        assert!(ExtractError::http_status(503, "u", "Fetch", None).is_transient());

        assert!(!ExtractError::http_status(404, "u", "Fetch", None).is_transient());
        assert!(!ExtractError::http_status(429, "u", "Fetch", None).is_transient());
        assert!(!ExtractError::invalid_url("u", "Extract", None).is_transient());
        assert!(!ExtractError::ssrf("u", "Fetch", None).is_transient());
        assert!(!ExtractError::parse("u", "Parse", None).is_transient());
    }

    #[test]
    fn boolean_helpers_match_codes() {
        assert!(ExtractError::invalid_url("u", "Extract", None).is_invalid_url());
        assert!(ExtractError::network("u", "Fetch", None).is_network());
        assert!(ExtractError::ssrf("u", "Fetch", None).is_ssrf());
        assert!(ExtractError::parse("u", "Parse", None).is_parse());
    }
}
