//! Configuration types for zonesync
//!
//! This module defines the configuration structures shared by the
//! reconciler, the scheduler and the daemon.

use serde::Deserialize;

/// Cron minute step of the built-in schedule (`*/15 * * * *`)
pub const CHECK_INTERVAL_MINUTES: u32 = 15;

/// IANA timezone the built-in schedule is evaluated in
pub const CHECK_TIMEZONE: &str = "Europe/Berlin";

/// The zone being reconciled
///
/// Built once at startup and moved into the reconciler. Never re-read from
/// the environment afterwards.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
#[derive(Clone, Deserialize)]
pub struct ZoneContext {
    /// Provider zone identifier
    pub zone_id: String,

    /// API bearer token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Target domain
    ///
    /// Informational only: every `A` record in the zone is reconciled
    /// regardless of its name.
    #[serde(default)]
    pub domain: Option<String>,
}

impl std::fmt::Debug for ZoneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneContext")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("domain", &self.domain)
            .finish()
    }
}

impl ZoneContext {
    /// Create a new zone context
    pub fn new(zone_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
            domain: None,
        }
    }

    /// Set the informational target domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Validate the zone context
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        if let Some(domain) = &self.domain
            && domain.trim().is_empty()
        {
            return Err(crate::Error::config("Domain, when set, cannot be empty"));
        }
        Ok(())
    }
}

/// Schedule configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleConfig {
    /// Minute step, as in cron's `*/N` minute field
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// IANA timezone name the minute field is evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            timezone: default_timezone(),
        }
    }
}

impl ScheduleConfig {
    /// Validate the schedule configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=59).contains(&self.interval_minutes) {
            return Err(crate::Error::config(format!(
                "Schedule interval must be between 1 and 59 minutes. Got: {}",
                self.interval_minutes
            )));
        }
        if self.timezone.is_empty() {
            return Err(crate::Error::config("Schedule timezone cannot be empty"));
        }
        Ok(())
    }
}

fn default_interval_minutes() -> u32 {
    CHECK_INTERVAL_MINUTES
}

fn default_timezone() -> String {
    CHECK_TIMEZONE.to_string()
}
