// ABOUTME: Page fetcher: HTTP retrieval with SSRF protection, size limits, and charset decoding.
// ABOUTME: Maps transport failures onto the error taxonomy (Network, HttpStatus, Timeout, Ssrf).

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};

use crate::error::ExtractError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a page.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
    /// Per-request deadline overriding the client-wide timeout.
    pub timeout: Option<Duration>,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body to text, using the charset from the Content-Type
    /// header when present, otherwise chardetng detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => {
            // RFC1918 private ranges
            let private_10: Ipv4Net = "10.0.0.0/8".parse().unwrap();
            let private_172: Ipv4Net = "172.16.0.0/12".parse().unwrap();
            let private_192: Ipv4Net = "192.168.0.0/16".parse().unwrap();
            // Loopback
            let loopback: Ipv4Net = "127.0.0.0/8".parse().unwrap();
            // Link-local
            let link_local: Ipv4Net = "169.254.0.0/16".parse().unwrap();

            private_10.contains(ip)
                || private_172.contains(ip)
                || private_192.contains(ip)
                || loopback.contains(ip)
                || link_local.contains(ip)
        }
        IpAddr::V6(ip) => {
            if ip.is_loopback() {
                return true;
            }
            // Unique local fc00::/7
            let unique_local: Ipv6Net = "fc00::/7".parse().unwrap();
            // Link-local fe80::/10
            let link_local: Ipv6Net = "fe80::/10".parse().unwrap();

            unique_local.contains(ip) || link_local.contains(ip)
        }
    }
}

/// Decode body bytes to a String using the Content-Type charset or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Verify that a host does not resolve to a private address.
async fn check_host_public(url: &str, host: &str, port: u16) -> Result<(), ExtractError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(ExtractError::ssrf(
                url,
                "Fetch",
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
        return Ok(());
    }

    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        ExtractError::network(
            url,
            "Fetch",
            Some(anyhow::anyhow!("DNS lookup failed: {}", e)),
        )
    })?;

    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(ExtractError::ssrf(
                url,
                "Fetch",
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
    }
    Ok(())
}

/// Fetch a page from the given URL.
///
/// Non-2xx statuses, oversized bodies, timeouts, and SSRF-blocked targets are
/// all returned as typed errors; this function never panics on bad input.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ExtractError> {
    if url.is_empty() {
        return Err(ExtractError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        ExtractError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if !opts.allow_private_networks {
        if let Some(host) = parsed_url.host_str() {
            let port = parsed_url
                .port()
                .unwrap_or(if scheme == "https" { 443 } else { 80 });
            check_host_public(url, host, port).await?;
        }
    }

    let mut request = client.get(url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }
    if let Some(deadline) = opts.timeout {
        request = request.timeout(deadline);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::timeout(url, "Fetch", Some(anyhow::anyhow!("request timed out: {}", e)))
        } else {
            ExtractError::network(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        }
    })?;

    // SSRF check after redirects: the final URL must not be private either.
    if !opts.allow_private_networks {
        let final_url_ref = response.url();
        if let Some(host) = final_url_ref.host_str() {
            let port = final_url_ref
                .port()
                .unwrap_or(if final_url_ref.scheme() == "https" {
                    443
                } else {
                    80
                });
            let host = host.to_string();
            check_host_public(url, &host, port).await?;
        }
    }

    let status = response.status();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !status.is_success() {
        return Err(ExtractError::http_status(
            status.as_u16(),
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    // Check Content-Length before reading the body.
    let content_length = response.content_length().or_else(|| {
        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    });
    if let Some(len) = content_length {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ExtractError::network(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = status.as_u16();
    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::timeout(
                url,
                "Fetch",
                Some(anyhow::anyhow!("body read timed out: {}", e)),
            )
        } else {
            ExtractError::network(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        }
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ExtractError::network(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    Ok(FetchResult {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn create_test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap()
    }

    fn private_opts() -> FetchOptions {
        FetchOptions {
            allow_private_networks: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/test");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body>hello</body></html>");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/test"), &private_opts()).await;
        mock.assert();

        let result = result.expect("fetch should succeed");
        assert_eq!(result.status, 200);
        assert!(result.text().contains("hello"));
    }

    #[tokio::test]
    async fn fetch_404_is_http_status_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not found");
        });

        let client = create_test_client();
        let err = fetch(&client, &server.url("/missing"), &private_opts())
            .await
            .expect_err("should fail on 404");
        mock.assert();

        assert!(err.is_http_status());
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn fetch_204_is_success() {
        // Any 2xx counts as a successful fetch, not just 200.
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/empty");
            then.status(204);
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/empty"), &private_opts())
            .await
            .expect("2xx should succeed");
        mock.assert();
        assert_eq!(result.status, 204);
        assert!(result.body.is_empty());
    }

    #[tokio::test]
    async fn custom_headers_are_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/hdr")
                .header("x-probe", "field-check");
            then.status(200).body("ok");
        });

        let client = create_test_client();
        let mut opts = private_opts();
        opts.headers
            .insert("x-probe".to_string(), "field-check".to_string());

        fetch(&client, &server.url("/hdr"), &opts)
            .await
            .expect("fetch with headers should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn private_ip_blocked_by_default() {
        let server = MockServer::start();
        let url = format!("http://127.0.0.1:{}/test", server.port());

        let client = create_test_client();
        let err = fetch(&client, &url, &FetchOptions::default())
            .await
            .expect_err("should fail on private IP");
        assert!(err.is_ssrf());
    }

    #[tokio::test]
    async fn bad_scheme_is_invalid_url() {
        let client = create_test_client();
        let err = fetch(&client, "ftp://example.com/file", &FetchOptions::default())
            .await
            .expect_err("ftp scheme rejected");
        assert!(err.is_invalid_url());
    }

    #[tokio::test]
    async fn empty_url_is_invalid() {
        let client = create_test_client();
        let err = fetch(&client, "", &FetchOptions::default())
            .await
            .expect_err("empty URL rejected");
        assert!(err.is_invalid_url());
    }

    #[test]
    fn is_private_ip_v4() {
        assert!(is_private_ip(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_ip(&"192.168.0.1".parse().unwrap()));
        assert!(is_private_ip(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"169.254.0.1".parse().unwrap()));

        assert!(!is_private_ip(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip(&"1.1.1.1".parse().unwrap()));
        assert!(!is_private_ip(&"172.32.0.1".parse().unwrap())); // outside 172.16/12
    }

    #[test]
    fn is_private_ip_v6() {
        assert!(is_private_ip(&"::1".parse().unwrap()));
        assert!(is_private_ip(&"fc00::1".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));

        assert!(!is_private_ip(&"2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn charset_extraction() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn decode_body_with_charset_header() {
        let body = "hello world".as_bytes();
        let decoded = decode_body(body, Some("text/plain; charset=utf-8"));
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn decode_body_detects_latin1() {
        // ISO-8859-1 "café" (e-acute = 0xe9), no charset header.
        let iso_bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        let decoded = decode_body(iso_bytes, None);
        assert_eq!(decoded, "café");
    }

    #[test]
    fn max_content_length_is_ten_mb() {
        assert_eq!(MAX_CONTENT_LENGTH, 10 * 1024 * 1024);
    }
}
