// # DNS Provider Trait
//
// Defines the interface for reading and writing a zone's DNS records via a
// provider API.
//
// ## Implementations
//
// - Cloudflare: `zonesync-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::traits::{DnsProvider, RecordType, RecordUpdate};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for record in provider.list_records("zone-id").await? {
//         if record.record_type == RecordType::A {
//             let update = RecordUpdate::a_record(&record.name, "203.0.113.9".parse()?);
//             provider.update_record("zone-id", &record.id, &update).await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// TTL written with every record update, in seconds
pub const UPDATE_TTL_SECS: u32 = 120;

/// DNS record type as reported by the provider
///
/// Only [`RecordType::A`] is ever acted upon. Types zonesync has no
/// name for deserialize to [`RecordType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
    #[serde(other)]
    Other,
}

/// A DNS record as listed by the provider
///
/// This is a read-only snapshot: it is fetched fresh on every
/// reconciliation cycle and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    /// The record ID (provider-assigned, opaque)
    pub id: String,
    /// The record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// The record name (fully qualified hostname)
    pub name: String,
    /// The record content; an IPv4 address for `A` records
    pub content: String,
    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: u32,
    /// Provider proxy flag
    #[serde(default)]
    pub proxied: bool,
}

/// Full replacement payload for an `A` record
///
/// The whole record is re-specified on every write. TTL and the proxy
/// flag are not caller-controlled; see [`RecordUpdate::a_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    record_type: RecordType,
    name: String,
    content: Ipv4Addr,
    ttl: u32,
    proxied: bool,
}

impl RecordUpdate {
    /// Build an `A` record update with TTL 120 and proxying disabled
    pub fn a_record(name: impl Into<String>, content: Ipv4Addr) -> Self {
        Self {
            record_type: RecordType::A,
            name: name.into(),
            content,
            ttl: UPDATE_TTL_SECS,
            proxied: false,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> Ipv4Addr {
        self.content
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn proxied(&self) -> bool {
        self.proxied
    }
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (failure classes are decided by `Reconciler`)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Filter the listing (type filtering is owned by `Reconciler`)
/// - ❌ Cache records between calls
///
/// One call performs exactly one API request. A failed request is
/// returned as an error; the reconciler decides whether it is fatal.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record in a zone, in provider order
    ///
    /// All record types are returned, not just `A`.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: The zone's full record set
    /// - `Err(Error)`: If the request or the response was unusable
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace a single record with the given payload
    ///
    /// # Parameters
    ///
    /// - `zone_id`: The zone holding the record
    /// - `record_id`: The provider-assigned record ID
    /// - `update`: The full record payload
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
