//! Wall-clock scheduling of reconciliation cycles
//!
//! [`Schedule`] is the cron rule `*/N * * * *` evaluated in a fixed IANA
//! timezone. [`Scheduler`] runs one cycle at startup and one per tick
//! until it is stopped or a cycle fails fatally.
//!
//! There is no jitter, no catch-up for missed ticks and no persisted
//! "last run": a restarted process simply starts over with a startup cycle.

use crate::config::ScheduleConfig;
use crate::engine::{CycleReport, Reconciler};
use crate::error::{Error, Result};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

/// Upper bound on the minute scan in [`Schedule::next_after`]
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Cron-style minute schedule in a fixed timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    every_minutes: u32,
    timezone: Tz,
}

impl Schedule {
    /// Create a schedule firing whenever the local minute is a multiple of
    /// `every_minutes`
    pub fn new(every_minutes: u32, timezone: &str) -> Result<Self> {
        ScheduleConfig {
            interval_minutes: every_minutes,
            timezone: timezone.to_string(),
        }
        .validate()?;

        let timezone: Tz = timezone
            .parse()
            .map_err(|e| Error::config(format!("Unknown timezone '{}': {}", timezone, e)))?;

        Ok(Self {
            every_minutes,
            timezone,
        })
    }

    /// Create a schedule from configuration
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::new(config.interval_minutes, &config.timezone)
    }

    /// First tick strictly after `after`
    ///
    /// Ticks fall on whole minutes. The minute is checked in local time, so
    /// timezones with non-hour offsets and DST transitions are handled the
    /// way cron handles them.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let first = (after.timestamp().div_euclid(60) + 1) * 60;

        (0..MINUTES_PER_DAY).find_map(|step| {
            let candidate = DateTime::<Utc>::from_timestamp(first + step * 60, 0)?;
            let local_minute = candidate.with_timezone(&self.timezone).minute();
            (local_minute % self.every_minutes == 0).then_some(candidate)
        })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*/{} * * * * ({})", self.every_minutes, self.timezone.name())
    }
}

/// What started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Startup,
    Scheduled,
}

impl fmt::Display for CycleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleTrigger::Startup => f.write_str("initial"),
            CycleTrigger::Scheduled => f.write_str("scheduled"),
        }
    }
}

type CycleResult = (CycleTrigger, Result<CycleReport>);

/// Drives a [`Reconciler`] on a [`Schedule`]
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. Start with [`Scheduler::run()`]
/// 3. Runs until SIGTERM or Ctrl-C (returns `Ok`) or a fatal cycle error (returns `Err`)
///
/// Every trigger spawns its own cycle task. Overlapping cycles are
/// serialized by the reconciler, so a tick that fires while the startup
/// cycle is still running waits for it.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    schedule: Schedule,
    /// Wall clock used to place ticks
    clock: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(reconciler: Arc<Reconciler>, schedule: Schedule) -> Self {
        Self {
            reconciler,
            schedule,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the wall clock ticks are computed from
    ///
    /// Only the tick arithmetic reads this clock; waiting still happens in
    /// real time.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Run the scheduler
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Stopped by SIGTERM or Ctrl-C
    /// - `Err(Error)`: A cycle could not resolve the IP or list records
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only helper to run the scheduler with a controlled shutdown signal
    ///
    /// **TESTING ONLY**: production code should use `run()`, which stops
    /// on SIGTERM or Ctrl-C instead of a programmatic channel.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            "Setting up schedule to run IP update check {}",
            self.schedule
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                    info!("Shutdown requested");
                }
                None => match wait_for_shutdown_signal().await {
                    Ok(signal) => info!("Received {}", signal),
                    Err(e) => {
                        warn!("Failed to listen for shutdown signals, running until killed: {}", e);
                        std::future::pending::<()>().await;
                    }
                },
            }
        };
        tokio::pin!(shutdown);

        let mut cycles: JoinSet<CycleResult> = JoinSet::new();

        info!("Running initial IP update check...");
        self.spawn_cycle(&mut cycles, CycleTrigger::Startup);

        let mut last_tick: Option<DateTime<Utc>> = None;

        loop {
            let now = (self.clock)();
            let from = last_tick.map_or(now, |tick| tick.max(now));
            let next_tick = self
                .schedule
                .next_after(from)
                .ok_or_else(|| Error::Other(format!("No upcoming tick for {}", self.schedule)))?;
            let wait = (next_tick - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_tick = Some(next_tick);
                    info!("Running scheduled IP update check...");
                    self.spawn_cycle(&mut cycles, CycleTrigger::Scheduled);
                }

                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    Self::finish_cycle(joined)?;
                }

                _ = &mut shutdown => {
                    cycles.abort_all();
                    break;
                }
            }
        }

        Ok(())
    }

    fn spawn_cycle(&self, cycles: &mut JoinSet<CycleResult>, trigger: CycleTrigger) {
        let reconciler = Arc::clone(&self.reconciler);
        cycles.spawn(async move { (trigger, reconciler.reconcile_all().await) });
    }

    /// Interpret a finished cycle: log it, or surface a fatal error
    fn finish_cycle(joined: std::result::Result<CycleResult, JoinError>) -> Result<()> {
        match joined {
            Ok((trigger, Ok(report))) => {
                info!(
                    "Finished {} update check for {}: {} A record(s) checked, {} updated, {} failed",
                    trigger,
                    report.public_ip,
                    report.checked(),
                    report.updated(),
                    report.failed()
                );
                Ok(())
            }
            Ok((trigger, Err(e))) => {
                error!("Error in {} update: {}", trigger, e);
                Err(e)
            }
            Err(e) => {
                error!("Reconciliation task failed: {}", e);
                Err(Error::Other(format!("Reconciliation task failed: {}", e)))
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
}
