// ABOUTME: The immutable ExtractionRequest value passed to Client::extract.
// ABOUTME: Pairs a URL with a field rule and an optional per-request deadline.

use std::time::Duration;

use crate::selector::{FieldRule, SelectorSpec};

/// One extraction to perform: which page, which field, and optionally how
/// long to wait for it. Constructed by the caller and never mutated.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: String,
    pub rule: FieldRule,
    pub timeout: Option<Duration>,
}

impl ExtractionRequest {
    /// Build a request from a URL and a field rule.
    pub fn new(url: impl Into<String>, rule: FieldRule) -> Self {
        Self {
            url: url.into(),
            rule,
            timeout: None,
        }
    }

    /// Build a request with a single selector.
    pub fn with_selector(url: impl Into<String>, spec: SelectorSpec) -> Self {
        Self::new(url, FieldRule::single(spec))
    }

    /// Set a per-request deadline, overriding the client-wide timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
