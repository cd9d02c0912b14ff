//! Contract Test: Signal Shutdown
//!
//! Verifies that `Scheduler::run()` treats SIGTERM as a clean stop, the way
//! a service manager ends the daemon.
//!
//! Lives in its own test binary because it signals the whole process.

#![cfg(unix)]

mod common;

use common::*;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use zonesync_core::traits::RecordType;
use zonesync_core::{Schedule, Scheduler};

#[tokio::test]
async fn sigterm_stops_the_scheduler_cleanly() {
    let ip_source = StaticIpSource::new(Ipv4Addr::new(203, 0, 113, 9));
    let provider = MockDnsProvider::new(vec![record(
        "r1",
        RecordType::A,
        "a.fnobaby.dev",
        "203.0.113.9",
    )]);
    let schedule = Schedule::new(15, "Europe/Berlin").expect("valid schedule");
    let scheduler = Scheduler::new(Arc::new(reconciler(&ip_source, &provider)), schedule);

    let handle = tokio::spawn(async move { scheduler.run().await });

    // On this single-threaded runtime the startup cycle only runs once the
    // scheduler has yielded, by which point its signal handlers are installed.
    for _ in 0..200 {
        if provider.list_call_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(provider.list_call_count(), 1, "startup cycle never ran");

    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("kill is available");
    assert!(status.success());

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler stops after SIGTERM")
        .unwrap();
    assert!(result.is_ok(), "got {:?}", result);
}
