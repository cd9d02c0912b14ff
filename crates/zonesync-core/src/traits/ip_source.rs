// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP IP-echo service: `zonesync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public address: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O against the echo service they were configured with
/// - ✅ Parse and validate the returned address
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic
/// - ❌ Cache the address between calls (every cycle resolves fresh)
/// - ❌ Spawn polling loops (scheduling is owned by `Scheduler`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current address
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name of the source (for logging/debugging)
    fn source_name(&self) -> &'static str {
        "ip-source"
    }
}
