// # zonesync-core
//
// Core library for zonesync, a dynamic DNS updater that keeps every `A`
// record of a zone pointed at the caller's current public IPv4 address.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for resolving the current public IPv4 address
// - **DnsProvider**: Trait for listing and updating a zone's records
// - **Reconciler**: Runs one resolve → list → update cycle
// - **Scheduler**: Runs cycles at startup and on a cron-style wall-clock schedule
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic lives here, HTTP adapters live in their own crates
// 2. **Explicit Failure Classes**: Read failures end the cycle with `Err`, write failures are per record
// 3. **No Hidden State**: Every cycle starts from scratch; nothing is cached or persisted
// 4. **Library-First**: The daemon only wires components together

pub mod traits;
pub mod engine;
pub mod schedule;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, RecordType, RecordUpdate};
pub use engine::{CycleReport, RecordOutcome, RecordReport, Reconciler};
pub use schedule::{Schedule, Scheduler};
pub use config::{ScheduleConfig, ZoneContext};
pub use error::{Error, Result};
