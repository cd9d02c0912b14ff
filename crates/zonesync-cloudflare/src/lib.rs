// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 implementation of
// `zonesync_core::DnsProvider`.
//
// ## Behavior
//
// - ✅ One HTTP request per trait call
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status codes mapped to specific errors (401/403, 404, 409, 429, 5xx)
// - ✅ Envelope `success: false` treated as failure even on HTTP 200
// - ❌ NO retry or backoff (failure handling is owned by the reconciler)
// - ❌ NO record filtering (the reconciler decides which records to touch)
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs or in `Debug` output
// - Provider refuses to build with an empty token
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use zonesync_core::traits::{DnsProvider, DnsRecord, RecordUpdate};
use zonesync_core::{Error, Result, ZoneContext};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "cloudflare";

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    /// Unwrap `result`, turning `success: false` into an error
    fn into_result(self, action: &str) -> Result<T> {
        if !self.success {
            let detail = self
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} rejected: {}", action, detail),
            ));
        }

        self.result.ok_or_else(|| {
            Error::provider(
                PROVIDER_NAME,
                format!("Invalid response format: {} returned no result", action),
            )
        })
    }
}

/// Cloudflare DNS provider
///
/// Stateless and single-shot: every trait call is one API request.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without a trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Create a provider authenticated with the zone's token
    pub fn for_zone(zone: &ZoneContext) -> Result<Self> {
        Self::new(zone.api_token.clone())
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Authenticate and send a prepared request, then decode the envelope
    ///
    /// `action` and `subject` only shape error messages.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
        subject: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, action, subject));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", action, e)))?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;

        envelope.into_result(action)
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: reqwest::StatusCode, body: &str, action: &str, subject: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions for {}. Status: {}",
            action, status
        )),
        404 => Error::not_found(format!("{} ({}). Status: {}", subject, action, status)),
        409 => Error::provider(
            PROVIDER_NAME,
            format!(
                "Conflict: {} is being modified by another process. Status: {}",
                subject, status
            ),
        ),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded during {}. Status: {}",
            action, status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", action, status, body),
        ),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every record of the zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing DNS records for zone {}", zone_id);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let records: Vec<DnsRecord> = self
            .execute(request, "record listing", &format!("zone {}", zone_id))
            .await?;

        tracing::debug!("Cloudflare returned {} record(s)", records.len());
        Ok(records)
    }

    /// Replace a record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.net",
    ///   "content": "203.0.113.9",
    ///   "ttl": 120,
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        tracing::debug!(
            "Sending PUT for record {} ({}) -> {}",
            update.name(),
            record_id,
            update.content()
        );

        let request = self.client.put(self.record_url(zone_id, record_id)).json(update);
        let _: serde_json::Value = self
            .execute(request, "record update", &format!("record {}", record_id))
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
