//! Contract Test: Run Loop & Shutdown
//!
//! Constraints verified:
//! - The first tick happens immediately, then one tick per interval
//! - The driver stops promptly when the shutdown future resolves
//! - A shutdown requested before or during a tick is honored without
//!   waiting for the next interval
//! - Log store failures during a tick do not stop the loop
//! - Startup failures are returned to the caller

mod common;

use common::*;
use iplog_core::store::{FileLogStore, MemoryLogStore};
use iplog_core::traits::LogStore;
use iplog_core::{DriverEvent, IpLogDriver};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn ticks_once_immediately_then_once_per_interval() {
    let resolver = ScriptedResolver::fixed(ip([1, 2, 3, 4]));
    let calls = ScriptedResolver::sharing_counters_with(&resolver);
    let store = MemoryLogStore::new();

    let (driver, _event_rx) =
        IpLogDriver::new(Box::new(resolver), Box::new(store.clone()), &test_config(60))
            .expect("driver construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { driver.run_with_shutdown(Some(shutdown_rx)).await });

    // t = 0, 60, 120
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(calls.call_count(), 3);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    // Same IP every tick → one entry
    assert_eq!(store.read_all_entries().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_sleep_stops_promptly() {
    let resolver = ScriptedResolver::fixed(ip([1, 2, 3, 4]));
    let calls = ScriptedResolver::sharing_counters_with(&resolver);

    let (driver, mut event_rx) = IpLogDriver::new(
        Box::new(resolver),
        Box::new(MemoryLogStore::new()),
        &test_config(3600),
    )
    .expect("driver construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { driver.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_secs(30)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(result.is_ok(), "driver should stop without waiting for the interval");
    result.unwrap().unwrap().unwrap();

    assert_eq!(calls.call_count(), 1);

    let events = drain_events(&mut event_rx);
    assert!(matches!(
        events.first(),
        Some(DriverEvent::Started { previous_entries: 0, created: true })
    ));
    assert!(matches!(events.get(1), Some(DriverEvent::EntryAppended { previous_ip: None, .. })));
    assert!(matches!(events.last(), Some(DriverEvent::Stopped { .. })));
}

#[tokio::test(start_paused = true)]
async fn shutdown_requested_during_startup_skips_the_first_tick() {
    let resolver = ScriptedResolver::fixed(ip([1, 2, 3, 4]));
    let calls = ScriptedResolver::sharing_counters_with(&resolver);
    let store = MemoryLogStore::new();

    let (driver, mut event_rx) =
        IpLogDriver::new(Box::new(resolver), Box::new(store.clone()), &test_config(60))
            .expect("driver construction succeeds");

    // Already resolved by the time the loop looks at it
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    shutdown_tx.send(()).unwrap();

    driver.run_with_shutdown(Some(shutdown_rx)).await.unwrap();

    assert_eq!(calls.call_count(), 0);
    assert!(store.read_all_entries().await.unwrap().is_empty());

    let events = drain_events(&mut event_rx);
    assert!(matches!(events.first(), Some(DriverEvent::Started { .. })));
    assert!(matches!(events.last(), Some(DriverEvent::Stopped { .. })));
    assert_eq!(events.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_slow_resolve_finishes_the_tick_then_stops() {
    let resolver = ScriptedResolver::fixed(ip([1, 2, 3, 4])).with_delay(Duration::from_secs(8));
    let calls = ScriptedResolver::sharing_counters_with(&resolver);
    let store = MemoryLogStore::new();

    let (driver, mut event_rx) =
        IpLogDriver::new(Box::new(resolver), Box::new(store.clone()), &test_config(3600))
            .expect("driver construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { driver.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_secs(2)).await;
    shutdown_tx.send(()).unwrap();

    // Resolve completes at t = 8; the hour-long interval is never waited out
    let result = tokio::time::timeout(Duration::from_secs(10), handle).await;
    assert!(result.is_ok(), "driver should stop right after the tick in flight");
    result.unwrap().unwrap().unwrap();

    assert_eq!(calls.call_count(), 1);
    assert_eq!(store.read_all_entries().await.unwrap().len(), 1);

    let events = drain_events(&mut event_rx);
    assert!(matches!(events.get(1), Some(DriverEvent::EntryAppended { .. })));
    assert!(matches!(events.last(), Some(DriverEvent::Stopped { .. })));
}

#[tokio::test(start_paused = true)]
async fn store_failures_do_not_stop_the_loop() {
    let store = ReadOnlyLogStore::new();
    let appends = ReadOnlyLogStore::sharing_counters_with(&store);

    let (driver, mut event_rx) = IpLogDriver::new(
        Box::new(ScriptedResolver::fixed(ip([1, 2, 3, 4]))),
        Box::new(store),
        &test_config(10),
    )
    .expect("driver construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { driver.run_with_shutdown(Some(shutdown_rx)).await });

    // t = 0, 10
    tokio::time::sleep(Duration::from_secs(15)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(appends.append_call_count(), 2);

    let failures = drain_events(&mut event_rx)
        .into_iter()
        .filter(|e| matches!(e, DriverEvent::StoreFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn startup_failure_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let (driver, _event_rx) = IpLogDriver::new(
        Box::new(ScriptedResolver::fixed(ip([1, 2, 3, 4]))),
        Box::new(FileLogStore::new(blocker.join("ip_log.txt"))),
        &test_config(60),
    )
    .expect("driver construction succeeds");

    let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        driver.run_with_shutdown(Some(shutdown_rx)),
    )
    .await
    .expect("startup failure should return immediately");

    assert!(result.is_err());
}

#[tokio::test]
async fn restart_reuses_existing_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ip_log.txt");

    // First run
    {
        let (driver, mut event_rx) = IpLogDriver::new(
            Box::new(ScriptedResolver::fixed(ip([1, 2, 3, 4]))),
            Box::new(FileLogStore::new(&path)),
            &test_config(60),
        )
        .expect("driver construction succeeds");

        driver.startup().await.unwrap();
        driver.tick().await.unwrap();

        let events = drain_events(&mut event_rx);
        assert!(matches!(events[0], DriverEvent::Started { created: true, .. }));
    }

    // Second run, same IP
    {
        let (driver, mut event_rx) = IpLogDriver::new(
            Box::new(ScriptedResolver::fixed(ip([1, 2, 3, 4]))),
            Box::new(FileLogStore::new(&path)),
            &test_config(60),
        )
        .expect("driver construction succeeds");

        let previous = driver.startup().await.unwrap();
        assert_eq!(previous.len(), 1);
        driver.tick().await.unwrap();

        let events = drain_events(&mut event_rx);
        assert!(matches!(
            events[0],
            DriverEvent::Started { previous_entries: 1, created: false }
        ));
        assert!(matches!(events[1], DriverEvent::Unchanged { .. }));
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2, "header plus one entry");
}
