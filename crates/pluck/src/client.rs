// ABOUTME: The main Client that fetches pages and resolves field rules against them.
// ABOUTME: Provides async extract() plus extract_html() and registry-driven extract_known().

use std::net::ToSocketAddrs;

use url::Url;

use crate::error::ExtractError;
use crate::fetch::{fetch, FetchOptions};
use crate::options::{ClientBuilder, Options};
use crate::query::{parse_document, resolve_rule};
use crate::request::ExtractionRequest;
use crate::result::Extraction;
use crate::selector::{builtin_rules, FieldRule, RuleRegistry};

/// The field extractor client.
///
/// Cheap to share across tasks; concurrent `extract` calls share nothing
/// mutable. Each call produces a fresh result value.
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    rules: RuleRegistry,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            let allow_private = opts.allow_private_networks;
            let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
                let next = attempt.url().clone();
                if !allow_private {
                    if let Some(host) = next.host_str() {
                        let scheme = next.scheme();
                        let port = next
                            .port()
                            .unwrap_or(if scheme == "https" { 443 } else { 80 });
                        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
                            if crate::fetch::is_private_ip(&ip) {
                                return attempt.error("redirect to private IP blocked");
                            }
                        } else {
                            // synchronous DNS resolution to avoid async in redirect policy
                            let addr_str = format!("{}:{}", host, port);
                            match addr_str.to_socket_addrs() {
                                Ok(addrs) => {
                                    for sa in addrs {
                                        if crate::fetch::is_private_ip(&sa.ip()) {
                                            return attempt.error("redirect to private IP blocked");
                                        }
                                    }
                                }
                                Err(_) => {
                                    return attempt.error("DNS lookup failed during redirect");
                                }
                            }
                        }
                    }
                }
                attempt.follow()
            });

            reqwest::Client::builder()
                .redirect(redirect_policy)
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .expect("failed to build HTTP client")
        });

        let rules = opts.rules.clone().unwrap_or_else(builtin_rules);

        Self {
            opts,
            http_client,
            rules,
        }
    }

    /// Extract a field from the page at the request's URL.
    ///
    /// Fetches the page, parses it, and resolves the rule's fallback chain.
    /// Fetch and parse failures come back as typed errors; a rule that
    /// matches nothing is `Ok(Extraction::NotFound)`. Transient fetch
    /// failures are retried according to the configured [`RetryPolicy`];
    /// the default policy makes a single attempt.
    ///
    /// [`RetryPolicy`]: crate::retry::RetryPolicy
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, ExtractError> {
        let url = request.url.as_str();
        if url.is_empty() {
            return Err(ExtractError::invalid_url(url, "Extract", None));
        }
        if Url::parse(url).is_err() {
            return Err(ExtractError::invalid_url(
                url,
                "Extract",
                Some(anyhow::anyhow!("malformed URL")),
            ));
        }

        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
            allow_private_networks: self.opts.allow_private_networks,
            timeout: request.timeout,
        };

        let policy = self.opts.retry;
        let mut attempt = 1u32;
        let page = loop {
            match fetch(&self.http_client, url, &fetch_opts).await {
                Ok(page) => break page,
                Err(err) if attempt < policy.max_attempts && err.is_transient() => {
                    let delay = policy.backoff_delay(attempt);
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = policy.max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        code = %err.code,
                        "retrying transient fetch failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let text = page.text();
        let doc = parse_document(&text, url)?;
        let outcome = match resolve_rule(&doc, &request.rule) {
            Some(value) => Extraction::Found(value),
            None => Extraction::NotFound,
        };
        tracing::debug!(url, found = outcome.is_found(), "extraction finished");
        Ok(outcome)
    }

    /// Extract a field from a caller-supplied HTML string, without fetching.
    ///
    /// The URL is only context for error values; it must still be well
    /// formed so offline and online results describe pages the same way.
    pub fn extract_html(
        &self,
        html: &str,
        url: &str,
        rule: &FieldRule,
    ) -> Result<Extraction, ExtractError> {
        if url.is_empty() {
            return Err(ExtractError::invalid_url(url, "ExtractHTML", None));
        }
        if Url::parse(url).is_err() {
            return Err(ExtractError::invalid_url(
                url,
                "ExtractHTML",
                Some(anyhow::anyhow!("malformed URL")),
            ));
        }

        let doc = parse_document(html, url)?;
        match resolve_rule(&doc, rule) {
            Some(value) => Ok(Extraction::Found(value)),
            None => Ok(Extraction::NotFound),
        }
    }

    /// Extract a named field using the domain rule registry.
    ///
    /// Looks up the URL's host in the registry and runs the registered rule.
    /// An unknown domain or field name yields `NotFound`: with no rule,
    /// nothing can match.
    pub async fn extract_known(
        &self,
        url: &str,
        field: &str,
    ) -> Result<Extraction, ExtractError> {
        if url.is_empty() {
            return Err(ExtractError::invalid_url(url, "Extract", None));
        }
        let parsed = Url::parse(url).map_err(|_| {
            ExtractError::invalid_url(url, "Extract", Some(anyhow::anyhow!("malformed URL")))
        })?;
        let domain = parsed
            .host_str()
            .map(|h| h.to_lowercase())
            .unwrap_or_default();

        match self.rules.field(&domain, field).cloned() {
            Some(rule) => self.extract(&ExtractionRequest::new(url, rule)).await,
            None => {
                tracing::debug!(url, field, %domain, "no registered rule for domain");
                Ok(Extraction::NotFound)
            }
        }
    }

    /// The rule registry this client resolves named fields against.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorSpec;
    use pretty_assertions::assert_eq;

    const PRODUCT_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <h1 id="productTitle">  Widget Deluxe  </h1>
            <span id="priceblock_ourprice">  $19.99 </span>
        </body>
        </html>
    "#;

    fn client() -> Client {
        Client::builder().build()
    }

    #[test]
    fn extract_html_found_trims_whitespace() {
        let rule = FieldRule::single(SelectorSpec::id("priceblock_ourprice"));
        let outcome = client()
            .extract_html(PRODUCT_HTML, "https://example.test/p/1", &rule)
            .unwrap();
        assert_eq!(outcome, Extraction::Found("$19.99".to_string()));
    }

    #[test]
    fn extract_html_missing_is_not_found() {
        let rule = FieldRule::single(SelectorSpec::id("no_such_id"));
        let outcome = client()
            .extract_html(PRODUCT_HTML, "https://example.test/p/1", &rule)
            .unwrap();
        assert_eq!(outcome, Extraction::NotFound);
    }

    #[test]
    fn extract_html_fallback_chain() {
        let rule = FieldRule::chain(vec![
            SelectorSpec::id("priceblock_dealprice"),
            SelectorSpec::id("priceblock_ourprice"),
        ]);
        let outcome = client()
            .extract_html(PRODUCT_HTML, "https://example.test/p/1", &rule)
            .unwrap();
        assert_eq!(outcome, Extraction::Found("$19.99".to_string()));
    }

    #[test]
    fn extract_html_empty_content_is_parse_error() {
        let rule = FieldRule::single(SelectorSpec::css("h1"));
        let err = client()
            .extract_html("", "https://example.test/p/1", &rule)
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn extract_html_bad_url_is_invalid() {
        let rule = FieldRule::single(SelectorSpec::css("h1"));
        let err = client()
            .extract_html(PRODUCT_HTML, "not a url", &rule)
            .unwrap_err();
        assert!(err.is_invalid_url());
    }

    #[test]
    fn builder_rules_override_builtin() {
        let mut registry = RuleRegistry::new();
        registry.register(crate::selector::DomainRules {
            domain: "shop.test".to_string(),
            supported_domains: vec![],
            fields: [(
                "price".to_string(),
                FieldRule::single(SelectorSpec::css(".price")),
            )]
            .into_iter()
            .collect(),
        });

        let client = Client::builder().rules(registry).build();
        assert!(client.rules().field("shop.test", "price").is_some());
        assert!(client.rules().field("www.amazon.com", "price").is_none());
    }

    #[test]
    fn default_rules_are_builtin() {
        let client = client();
        assert!(client.rules().field("www.amazon.com", "price").is_some());
    }
}
