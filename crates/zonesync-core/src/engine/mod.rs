//! Zone reconciler
//!
//! The Reconciler is responsible for:
//! - Resolving the current public IP via IpSource
//! - Listing the zone's records via DnsProvider
//! - Updating every `A` record whose content has drifted
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐          ┌──────────────┐
//! │  IpSource   │── ip ───▶│  Reconciler  │◀── records ──┐
//! └─────────────┘          └──────────────┘              │
//!                                 │                ┌─────────────┐
//!                                 │ per stale A    │ DnsProvider │
//!                                 └───────────────▶│ (list/put)  │
//!                                                  └─────────────┘
//! ```
//!
//! ## Failure classes
//!
//! - Resolving the IP or listing records fails → the cycle aborts and
//!   [`Reconciler::reconcile_all`] returns `Err`. Nothing is written.
//! - Updating one record fails → logged with the record's id and name,
//!   recorded as [`RecordOutcome::Failed`], and the next record is attempted.

use crate::config::ZoneContext;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpSource, RecordType, RecordUpdate};
use std::net::Ipv4Addr;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// What a cycle did with a single listed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Not an `A` record; never touched
    SkippedType {
        record_type: RecordType,
    },

    /// Content already matched the public IP
    Unchanged,

    /// Content was rewritten to the public IP
    Updated {
        previous: String,
    },

    /// The write was attempted and failed
    Failed {
        error: String,
    },
}

/// A listed record together with the decision taken for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub record_id: String,
    pub record_name: String,
    pub outcome: RecordOutcome,
}

/// Result of one reconciliation cycle
///
/// Records appear in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The public IP this cycle reconciled against
    pub public_ip: Ipv4Addr,
    pub records: Vec<RecordReport>,
}

impl CycleReport {
    /// Number of `A` records inspected
    pub fn checked(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !matches!(r.outcome, RecordOutcome::SkippedType { .. }))
            .count()
    }

    pub fn updated(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Updated { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Failed { .. }))
            .count()
    }
}

/// Zone reconciler
///
/// Runs one straight-line resolve → list → update procedure per call, with
/// no memory of earlier cycles.
///
/// ## Threading
///
/// The reconciler is shared between the startup run and scheduled runs.
/// Cycles are serialized: a call to [`Reconciler::reconcile_all`] waits
/// until any cycle already in flight has finished.
pub struct Reconciler {
    /// IP source for the current public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Zone being reconciled
    zone: ZoneContext,

    /// Single-permit gate held for the duration of a cycle
    cycle_gate: Mutex<()>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `zone`: Zone configuration, validated here
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        zone: ZoneContext,
    ) -> Result<Self> {
        zone.validate()?;

        match &zone.domain {
            Some(domain) => info!(
                "Reconciling every A record in zone {} (domain: {})",
                zone.zone_id, domain
            ),
            None => info!("Reconciling every A record in zone {}", zone.zone_id),
        }

        Ok(Self {
            ip_source,
            provider,
            zone,
            cycle_gate: Mutex::new(()),
        })
    }

    /// Run one reconciliation cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: The cycle ran to completion. Individual update
    ///   failures are reported per record, not here.
    /// - `Err(Error)`: The public IP or the record listing could not be
    ///   obtained. No record was written.
    pub async fn reconcile_all(&self) -> Result<CycleReport> {
        let _cycle = self.cycle_gate.lock().await;

        // Fatal read errors are logged by the scheduler.
        let public_ip = self.ip_source.current().await.map_err(|e| {
            if matches!(e, Error::IpSource(_)) {
                e
            } else {
                Error::ip_source(e.to_string())
            }
        })?;
        debug!(
            "Current public IP from {}: {}",
            self.ip_source.source_name(),
            public_ip
        );

        let listed = self.provider.list_records(&self.zone.zone_id).await?;
        debug!(
            "Listed {} record(s) in zone {} from {}",
            listed.len(),
            self.zone.zone_id,
            self.provider.provider_name()
        );

        let mut records = Vec::with_capacity(listed.len());
        for record in listed {
            let outcome = self.reconcile_record(&record, public_ip).await;
            records.push(RecordReport {
                record_id: record.id,
                record_name: record.name,
                outcome,
            });
        }

        Ok(CycleReport { public_ip, records })
    }

    /// Decide and apply the change for a single listed record
    async fn reconcile_record(&self, record: &DnsRecord, public_ip: Ipv4Addr) -> RecordOutcome {
        if record.record_type != RecordType::A {
            debug!("Skipping {} record {}", type_label(record.record_type), record.name);
            return RecordOutcome::SkippedType {
                record_type: record.record_type,
            };
        }

        let target = public_ip.to_string();
        if record.content == target {
            info!("No change for {}, IP is already correct.", record.name);
            return RecordOutcome::Unchanged;
        }

        info!(
            "IP has changed for {}: {} => {}",
            record.name, record.content, target
        );

        let update = RecordUpdate::a_record(&record.name, public_ip);
        match self
            .provider
            .update_record(&self.zone.zone_id, &record.id, &update)
            .await
        {
            Ok(()) => {
                info!(
                    "Updated DNS record {} ({}) to IP: {}",
                    record.name, record.id, target
                );
                RecordOutcome::Updated {
                    previous: record.content.clone(),
                }
            }
            Err(e) => {
                error!(
                    "Error updating DNS record {} ({}): {}",
                    record.id, record.name, e
                );
                RecordOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

fn type_label(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::A => "A",
        RecordType::Aaaa => "AAAA",
        RecordType::Cname => "CNAME",
        RecordType::Mx => "MX",
        RecordType::Txt => "TXT",
        RecordType::Ns => "NS",
        RecordType::Srv => "SRV",
        RecordType::Caa => "CAA",
        RecordType::Other => "non-A",
    }
}
