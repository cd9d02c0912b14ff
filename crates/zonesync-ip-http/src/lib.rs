// # HTTP IP Source
//
// This crate resolves the caller's public IPv4 address by asking an
// external IP-echo service (e.g. icanhazip.com, ipify.org), which answers
// with the address as plain text.
//
// ## Behavior
//
// - One GET request per `current()` call; nothing is cached
// - The body is trimmed and must parse as an IPv4 address
// - Any failure (network, non-2xx, malformed body) is returned as
//   `Error::IpSource`; the reconciler treats it as fatal for the cycle

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use zonesync_core::traits::IpSource;
use zonesync_core::{Error, Result};

/// Default IP-echo endpoint (IPv4-only variant)
pub const DEFAULT_IP_SERVICE_URL: &str = "https://ipv4.icanhazip.com";

/// Per-request timeout for the echo service
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL of a plain-text IPv4 echo service
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Create a source pointed at [`DEFAULT_IP_SERVICE_URL`]
    pub fn with_default_url() -> Result<Self> {
        Self::new(DEFAULT_IP_SERVICE_URL)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current address from the echo service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{} answered with HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        parse_ipv4(&body)
    }
}

/// Parse an echo-service body into an IPv4 address
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::ip_source(format!("Invalid IPv4 address: '{}'", text)))
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.fetch_ip().await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
