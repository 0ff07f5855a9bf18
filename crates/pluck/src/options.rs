// ABOUTME: Configuration options for the extractor client and the fluent ClientBuilder.
// ABOUTME: Covers timeout, user agent, headers, SSRF policy, retry policy, and rule registry.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;
use crate::retry::RetryPolicy;
use crate::selector::RuleRegistry;

/// Configuration options for the extractor client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub headers: HashMap<String, String>,
    pub retry: RetryPolicy,
    pub http_client: Option<reqwest::Client>,
    pub rules: Option<RuleRegistry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "pluck/0.1".to_string(),
            allow_private_networks: false,
            headers: HashMap::new(),
            retry: RetryPolicy::default(),
            http_client: None,
            rules: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client-wide request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set the retry policy for transient fetch failures.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.opts.retry = policy;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Use a custom rule registry instead of the builtin rules.
    pub fn rules(mut self, rules: RuleRegistry) -> Self {
        self.opts.rules = Some(rules);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}
