//! Contract Test: Run Cancellation
//!
//! Verifies that a run can be aborted mid-flight without writing anything,
//! and that a vanished shutdown sender is not mistaken for a shutdown request.

mod common;

use common::*;
use dyndns_core::{CounterTelemetry, Metric, ReconcileError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn shutdown_aborts_a_stuck_run() {
    let provider = FakeDnsProvider::with_a_record("203.0.113.5");
    let notifier = RecordingNotifier::new();
    let telemetry = Arc::new(CounterTelemetry::new());

    let reconciler = reconciler(
        PendingIpSource,
        provider.clone(),
        Some(notifier.clone()),
        telemetry.clone(),
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let run = tokio::spawn(async move { reconciler.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(()).expect("run still listening");

    let result = tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("run stops promptly")
        .expect("run task does not panic");

    let err = assert_err!(result);
    assert_eq!(err, ReconcileError::Cancelled);
    assert_eq!(provider.list_call_count(), 0);
    assert_eq!(provider.upsert_count(), 0);
    assert!(notifier.notified().is_empty());
    assert_eq!(telemetry.get(Metric::FailedRuns), 1);
    assert_eq!(telemetry.get(Metric::SuccessfulRuns), 0);
}

#[tokio::test]
async fn dropped_sender_does_not_cancel() {
    let provider = FakeDnsProvider::with_a_record("203.0.113.5");
    let telemetry = Arc::new(CounterTelemetry::new());

    let reconciler = reconciler(
        FixedIpSource::new("203.0.113.9"),
        provider.clone(),
        None,
        telemetry.clone(),
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    drop(shutdown_tx);

    let outcome = assert_ok!(reconciler.run_with_shutdown(Some(shutdown_rx)).await);

    assert!(outcome.is_updated());
    assert_eq!(provider.upsert_count(), 1);
    assert_eq!(telemetry.get(Metric::SuccessfulRuns), 1);
    assert_eq!(telemetry.get(Metric::FailedRuns), 0);
}

#[tokio::test]
async fn unused_shutdown_channel_lets_the_run_finish() {
    let provider = FakeDnsProvider::with_a_record("203.0.113.5");

    let reconciler = reconciler(
        FixedIpSource::new("203.0.113.5"),
        provider.clone(),
        None,
        Arc::new(CounterTelemetry::new()),
    );

    let (_shutdown_tx, shutdown_rx) = oneshot::channel();
    let outcome = assert_ok!(reconciler.run_with_shutdown(Some(shutdown_rx)).await);

    assert!(!outcome.is_updated());
}

#[tokio::test]
async fn run_completes_without_a_signal() {
    let provider = FakeDnsProvider::with_a_record("203.0.113.5");
    let telemetry = Arc::new(CounterTelemetry::new());

    let reconciler = reconciler(
        FixedIpSource::new("203.0.113.5"),
        provider.clone(),
        None,
        telemetry.clone(),
    );

    let outcome = assert_ok!(reconciler.run().await);

    assert!(!outcome.is_updated());
    assert_eq!(telemetry.get(Metric::SuccessfulRuns), 1);
}
