//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IPv4 address
//! - [`DnsProvider`]: List and update a zone's records via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, RecordType, RecordUpdate, UPDATE_TTL_SECS};
