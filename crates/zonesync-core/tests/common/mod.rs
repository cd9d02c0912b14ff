//! Test doubles and common utilities for reconciliation contract tests
//!
//! These doubles record every call so tests can assert on exactly what the
//! reconciler asked the provider to do.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use zonesync_core::error::{Error, Result};
use zonesync_core::traits::{DnsProvider, DnsRecord, IpSource, RecordType, RecordUpdate};
use zonesync_core::{Reconciler, ZoneContext};

pub const ZONE_ID: &str = "zone-test";

/// An IpSource that returns a fixed address, or always fails
pub struct StaticIpSource {
    ip: Option<Ipv4Addr>,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every call fails, like an unreachable echo service
    pub fn failing() -> Self {
        Self {
            ip: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::http("connection refused by ipv4.icanhazip.com"))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A recorded call to `update_record`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub update: RecordUpdate,
}

/// A mock DnsProvider serving a fixed listing
pub struct MockDnsProvider {
    /// Records returned by list_records()
    records: Vec<DnsRecord>,
    /// When set, list_records() fails with this HTTP status
    list_failure: Option<u16>,
    /// Listings that succeed before list_failure applies
    healthy_listings: usize,
    /// Record IDs whose update fails with HTTP 403
    failing_updates: HashSet<String>,
    /// Artificial latency for list_records()
    list_delay: Option<Duration>,
    list_call_count: Arc<AtomicUsize>,
    update_calls: Arc<std::sync::Mutex<Vec<UpdateCall>>>,
    /// Concurrently running list_records() calls
    in_flight: Arc<AtomicUsize>,
    /// Highest value in_flight ever reached
    max_in_flight: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records,
            list_failure: None,
            healthy_listings: 0,
            failing_updates: HashSet::new(),
            list_delay: None,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(std::sync::Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_list_failure(mut self, status: u16) -> Self {
        self.list_failure = Some(status);
        self
    }

    /// Serve `healthy` listings, then fail every later one with `status`
    pub fn with_list_failure_after(mut self, healthy: usize, status: u16) -> Self {
        self.list_failure = Some(status);
        self.healthy_listings = healthy;
        self
    }

    pub fn with_failing_update(mut self, record_id: &str) -> Self {
        self.failing_updates.insert(record_id.to_string());
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn updated_record_ids(&self) -> Vec<String> {
        self.update_calls()
            .into_iter()
            .map(|call| call.record_id)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: other.records.clone(),
            list_failure: other.list_failure,
            healthy_listings: other.healthy_listings,
            failing_updates: other.failing_updates.clone(),
            list_delay: other.list_delay,
            list_call_count: Arc::clone(&other.list_call_count),
            update_calls: Arc::clone(&other.update_calls),
            in_flight: Arc::clone(&other.in_flight),
            max_in_flight: Arc::clone(&other.max_in_flight),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _zone_id: &str) -> Result<Vec<DnsRecord>> {
        let previous_calls = self.list_call_count.fetch_add(1, Ordering::SeqCst);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.list_failure {
            Some(status) if previous_calls >= self.healthy_listings => Err(Error::provider(
                "mock",
                format!("Cloudflare server error (transient): {}", status),
            )),
            _ => Ok(self.records.clone()),
        }
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        self.update_calls.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            update: update.clone(),
        });

        if self.failing_updates.contains(record_id) {
            return Err(Error::auth("403 Forbidden"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a listed record
pub fn record(id: &str, record_type: RecordType, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type,
        name: name.to_string(),
        content: content.to_string(),
        ttl: 300,
        proxied: true,
    }
}

pub fn zone() -> ZoneContext {
    ZoneContext::new(ZONE_ID, "test-token").with_domain("fnobaby.dev")
}

/// Build a reconciler over doubles that share counters with the given ones
pub fn reconciler(ip_source: &StaticIpSource, provider: &MockDnsProvider) -> Reconciler {
    Reconciler::new(
        Box::new(StaticIpSource::sharing_counters_with(ip_source)),
        Box::new(MockDnsProvider::sharing_counters_with(provider)),
        zone(),
    )
    .expect("reconciler construction succeeds")
}
