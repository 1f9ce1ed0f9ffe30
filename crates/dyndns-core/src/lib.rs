// # dyndns-core
//
// Core library for the one-shot Route 53 dynamic DNS updater.
//
// ## Architecture Overview
//
// This library holds every decision the updater makes; the crates around it
// only move bytes:
// - **ip**: IP literal validation and address-level comparison
// - **IpSource**: Trait for resolving the caller's public IP
// - **DnsProvider**: Trait for listing record sets and submitting upserts
// - **RecordStore**: Reads the current record value, writes a new one
// - **Notifier**: Trait for best-effort push notifications
// - **Telemetry**: Run counters
// - **Reconciler**: One resolve → read → compare → write → notify pass
//
// ## Design Principles
//
// 1. **Explicit dependencies**: Collaborators are passed in, never global
// 2. **No local state**: Every run reads current truth from the provider
// 3. **Write only on change**: Equal addresses never produce an upsert
// 4. **Provider-agnostic errors**: One closed error taxonomy for all collaborators

pub mod traits;
pub mod ip;
pub mod record;
pub mod reconciler;
pub mod telemetry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpSource, Notifier};
pub use ip::{IpAddress, addresses_equal, is_valid_ip_address};
pub use record::{NameMatch, RECORD_TTL_SECS, RecordStore};
pub use reconciler::{Outcome, ReconcileError, Reconciler, RecordTarget};
pub use telemetry::{CounterTelemetry, Metric, Telemetry};
pub use config::{DyndnsConfig, HttpConfig, PushoverConfig};
pub use error::{Error, Result};
