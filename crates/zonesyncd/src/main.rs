// # zonesyncd - zonesync daemon
//
// This is a THIN integration layer: all reconciliation and scheduling logic
// lives in zonesync-core.
//
// The daemon is responsible for:
// 1. Loading a `.env` file, if present, into the environment
// 2. Reading and validating configuration from environment variables
// 3. Initializing logging and the runtime
// 4. Building the IP source, the Cloudflare provider and the reconciler
// 5. Running the scheduler and turning its outcome into an exit code
//
// ## Configuration
//
// - `CLOUDFLARE_ZONE_ID`: Zone whose A records are kept current (required)
// - `CLOUDFLARE_API_TOKEN`: API token with DNS edit permission (required)
// - `ZONESYNC_DOMAIN`: Target domain, informational only (optional)
// - `ZONESYNC_IP_SOURCE_URL`: Plain-text IPv4 echo service (optional)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export CLOUDFLARE_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export CLOUDFLARE_API_TOKEN=your_token
// export ZONESYNC_DOMAIN=example.net
//
// zonesyncd
// ```

use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonesync_cloudflare::CloudflareProvider;
use zonesync_core::config::{CHECK_INTERVAL_MINUTES, CHECK_TIMEZONE};
use zonesync_core::{Reconciler, Schedule, Scheduler, ZoneContext};
use zonesync_ip_http::{DEFAULT_IP_SERVICE_URL, HttpIpSource};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (public IP or record listing unavailable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Clone)]
struct Config {
    zone_id: String,
    api_token: String,
    domain: Option<String>,
    ip_source_url: String,
    log_level: String,
}

// Keep the token out of any accidental `{:?}`
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("ip_source_url", &self.ip_source_url)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} is required. Set it via: export {}=...", key, key))
        };

        Ok(Self {
            zone_id: required("CLOUDFLARE_ZONE_ID")?,
            api_token: required("CLOUDFLARE_API_TOKEN")?,
            domain: lookup("ZONESYNC_DOMAIN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            ip_source_url: lookup("ZONESYNC_IP_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_IP_SERVICE_URL.to_string()),
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs:
    /// - Value format validation (API token, domain name)
    /// - Security checks (placeholder tokens, URL schemes)
    /// - Log level enumeration validation
    fn validate(&self) -> Result<()> {
        // Cloudflare API tokens are typically 40 characters alphanumeric
        if self.api_token.len() < 20 {
            anyhow::bail!(
                "CLOUDFLARE_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters. \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "CLOUDFLARE_API_TOKEN appears to be a placeholder. \
                Use an actual API token from the Cloudflare dashboard."
            );
        }

        if let Some(ref domain) = self.domain {
            validate_domain_name(domain)?;
        }

        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            anyhow::bail!(
                "ZONESYNC_IP_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            );
        }

        if parse_log_level(&self.log_level).is_none() {
            anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn zone_context(&self) -> ZoneContext {
        let zone = ZoneContext::new(&self.zone_id, &self.api_token);
        match &self.domain {
            Some(domain) => zone.with_domain(domain),
            None => zone,
        }
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches common typos, not every invalid name.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // A missing .env file is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(&config)).into()
}

/// Build the scheduler and run it until it stops
async fn run_daemon(config: &Config) -> ZonesyncExitCode {
    let scheduler = match build_scheduler(config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Startup error: {}", e);
            return ZonesyncExitCode::ConfigError;
        }
    };

    exit_code_for(scheduler.run().await)
}

/// Map how the scheduler stopped to the process exit code
///
/// The scheduler has already logged the fatal error.
fn exit_code_for(outcome: zonesync_core::Result<()>) -> ZonesyncExitCode {
    match outcome {
        Ok(()) => {
            info!("Shutting down zonesyncd");
            ZonesyncExitCode::CleanShutdown
        }
        Err(_) => ZonesyncExitCode::RuntimeError,
    }
}

/// Wire the configured components into a scheduler
fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let zone = config.zone_context();

    let ip_source = HttpIpSource::new(&config.ip_source_url)?;
    info!("Public IP source: {}", ip_source.url());

    let provider = CloudflareProvider::for_zone(&zone)?;
    let reconciler = Reconciler::new(Box::new(ip_source), Box::new(provider), zone)?;

    let schedule = Schedule::new(CHECK_INTERVAL_MINUTES, CHECK_TIMEZONE)?;

    Ok(Scheduler::new(Arc::new(reconciler), schedule))
}
