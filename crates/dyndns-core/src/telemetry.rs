//! Run counters
//!
//! Four logical counters describe every run: exactly one of
//! successful/failed, and on success exactly one of changed/not-changed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter incremented by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    SuccessfulRuns,
    FailedRuns,
    IpAddressChanged,
    IpAddressNotChanged,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::SuccessfulRuns,
        Metric::FailedRuns,
        Metric::IpAddressChanged,
        Metric::IpAddressNotChanged,
    ];

    /// Exported counter name
    pub fn name(&self) -> &'static str {
        match self {
            Metric::SuccessfulRuns => "successful_runs",
            Metric::FailedRuns => "failed_runs",
            Metric::IpAddressChanged => "ip_address_changed",
            Metric::IpAddressNotChanged => "ip_address_not_changed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Metric::SuccessfulRuns => "Number of successful runs",
            Metric::FailedRuns => "Number of failed runs",
            Metric::IpAddressChanged => "The IP address has changed",
            Metric::IpAddressNotChanged => "The IP address has not changed",
        }
    }

    fn index(&self) -> usize {
        match self {
            Metric::SuccessfulRuns => 0,
            Metric::FailedRuns => 1,
            Metric::IpAddressChanged => 2,
            Metric::IpAddressNotChanged => 3,
        }
    }
}

/// Telemetry sink
pub trait Telemetry: Send + Sync {
    /// Add one to `metric`
    fn increment(&self, metric: Metric);
}

/// In-process counters, each increment traced at debug level
#[derive(Debug, Default)]
pub struct CounterTelemetry {
    counters: [AtomicU64; 4],
}

impl CounterTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `metric`
    pub fn get(&self, metric: Metric) -> u64 {
        self.counters[metric.index()].load(Ordering::SeqCst)
    }

    /// `(name, value)` for every counter, in [`Metric::ALL`] order
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        Metric::ALL.iter().map(|m| (m.name(), self.get(*m))).collect()
    }
}

impl Telemetry for CounterTelemetry {
    fn increment(&self, metric: Metric) {
        let value = self.counters[metric.index()].fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            metric = metric.name(),
            description = metric.description(),
            value,
            "counter incremented"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let telemetry = CounterTelemetry::new();
        for metric in Metric::ALL {
            assert_eq!(telemetry.get(metric), 0);
        }
    }

    #[test]
    fn increment_touches_only_its_counter() {
        let telemetry = CounterTelemetry::new();
        telemetry.increment(Metric::IpAddressChanged);
        telemetry.increment(Metric::IpAddressChanged);
        telemetry.increment(Metric::SuccessfulRuns);

        assert_eq!(
            telemetry.snapshot(),
            vec![
                ("successful_runs", 1),
                ("failed_runs", 0),
                ("ip_address_changed", 2),
                ("ip_address_not_changed", 0),
            ]
        );
    }
}
