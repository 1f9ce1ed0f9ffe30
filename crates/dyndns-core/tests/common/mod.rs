//! Test doubles and common utilities for reconciler contract tests
//!
//! Every double keeps its state behind `Arc`s, so a test can hand a clone to
//! the reconciler and keep the original to inspect calls afterwards.

#![allow(dead_code)]

use dyndns_core::error::{Error, Result};
use dyndns_core::traits::{
    ChangeReceipt, DnsProvider, IpSource, Notifier, RecordChange, RecordSet, RecordSetQuery,
};
use dyndns_core::{CounterTelemetry, IpAddress, RecordStore, Reconciler, RecordTarget};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "Z0123456789ABC";
pub const RECORD_NAME: &str = "home.example.com";

/// An IpSource returning a fixed answer
#[derive(Clone)]
pub struct FixedIpSource {
    answer: Arc<Mutex<Result<IpAddress>>>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: &str) -> Self {
        Self::with_answer(Ok(IpAddress::parse(ip).expect("test IP is valid")))
    }

    pub fn failing(error: Error) -> Self {
        Self::with_answer(Err(error))
    }

    fn with_answer(answer: Result<IpAddress>) -> Self {
        Self {
            answer: Arc::new(Mutex::new(answer)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the address returned by subsequent calls
    pub fn set_ip(&self, ip: &str) {
        *self.answer.lock().unwrap() = Ok(IpAddress::parse(ip).expect("test IP is valid"));
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddress> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.answer.lock().unwrap().clone()
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An IpSource that never answers (for cancellation testing)
pub struct PendingIpSource;

#[async_trait::async_trait]
impl IpSource for PendingIpSource {
    async fn current(&self) -> Result<IpAddress> {
        std::future::pending().await
    }

    fn source_name(&self) -> &'static str {
        "pending"
    }
}

/// An in-memory DnsProvider that tracks calls and applies upserts
#[derive(Clone)]
pub struct FakeDnsProvider {
    record_sets: Arc<Mutex<Vec<RecordSet>>>,
    list_error: Arc<Mutex<Option<Error>>>,
    upsert_error: Arc<Mutex<Option<Error>>>,
    list_call_count: Arc<AtomicUsize>,
    upserts: Arc<Mutex<Vec<(String, RecordChange)>>>,
}

impl FakeDnsProvider {
    /// Provider holding one A record for RECORD_NAME
    pub fn with_a_record(value: &str) -> Self {
        Self::with_record_sets(vec![record_set(RECORD_NAME, "A", &[value])])
    }

    pub fn with_record_sets(record_sets: Vec<RecordSet>) -> Self {
        Self {
            record_sets: Arc::new(Mutex::new(record_sets)),
            list_error: Arc::new(Mutex::new(None)),
            upsert_error: Arc::new(Mutex::new(None)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            upserts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_list_with(self, error: Error) -> Self {
        *self.list_error.lock().unwrap() = Some(error);
        self
    }

    pub fn fail_upsert_with(self, error: Error) -> Self {
        *self.upsert_error.lock().unwrap() = Some(error);
        self
    }

    /// Get the number of times list_record_sets() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times upsert_record() was called
    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    /// Get the recorded upserts
    pub fn upserts(&self) -> Vec<(String, RecordChange)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn list_record_sets(&self, _query: &RecordSetQuery) -> Result<Vec<RecordSet>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.record_sets.lock().unwrap().clone())
    }

    async fn upsert_record(&self, zone_id: &str, change: &RecordChange) -> Result<ChangeReceipt> {
        if let Some(error) = self.upsert_error.lock().unwrap().clone() {
            return Err(error);
        }

        self.upserts
            .lock()
            .unwrap()
            .push((zone_id.to_string(), change.clone()));

        let mut sets = self.record_sets.lock().unwrap();
        let set = record_set(&change.name, change.record_type.as_str(), &[&change.value]);
        match sets.iter_mut().find(|s| s.name.trim_end_matches('.') == change.name) {
            Some(existing) => *existing = set,
            None => sets.insert(0, set),
        }

        Ok(ChangeReceipt {
            id: format!("/change/C{}", self.upserts.lock().unwrap().len()),
            status: "PENDING".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// A Notifier that records the record names it was called with
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notified: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Record names passed to notify_record_updated(), failed sends included
    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_record_updated(&self, record_name: &str) -> Result<()> {
        self.notified.lock().unwrap().push(record_name.to_string());
        if self.fail {
            return Err(Error::notification("pushover answered 500 Internal Server Error"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

pub fn record_set(name: &str, record_type: &str, values: &[&str]) -> RecordSet {
    RecordSet {
        name: format!("{}.", name.trim_end_matches('.')),
        record_type: record_type.to_string(),
        ttl: Some(1800),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

/// Helper to wire a reconciler around the given doubles
pub fn reconciler(
    ip_source: impl IpSource + 'static,
    provider: FakeDnsProvider,
    notifier: Option<RecordingNotifier>,
    telemetry: Arc<CounterTelemetry>,
) -> Reconciler {
    Reconciler::new(
        Box::new(ip_source),
        RecordStore::new(Box::new(provider)),
        notifier.map(|n| Box::new(n) as Box<dyn Notifier>),
        telemetry,
        RecordTarget::new(ZONE_ID, RECORD_NAME),
    )
    .expect("reconciler construction succeeds")
}
