//! Reconciler: one pass of external IP vs. DNS record
//!
//! The Reconciler is responsible for:
//! - Resolving the current external IP via IpSource
//! - Reading the existing record value via RecordStore
//! - Upserting the record only when the addresses differ
//! - Notifying (best effort) after a change
//! - Counting the run outcome
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   IpAddress    ┌──────────────┐
//! │  IpSource   │───────────────▶│  Reconciler  │
//! └─────────────┘                └──────────────┘
//!                                        │
//!         ┌──────────────────────────────┼──────────────────────────┐
//!         │                              │                          │
//!         ▼                              ▼                          ▼
//! ┌─────────────────┐          ┌─────────────────┐        ┌─────────────────┐
//! │  RecordStore    │          │    Notifier     │        │    Telemetry    │
//! │ (read, upsert)  │          │ (best effort)   │        │   (counters)    │
//! └─────────────────┘          └─────────────────┘        └─────────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Resolve external IP (fail: "failed to retrieve external IP address")
//! 2. Read the existing record and validate its value
//!    (fail: "failed to retrieve existing DNS record")
//! 3. Compare parsed addresses
//! 4. Equal: done, nothing written
//! 5. Different: re-validate, upsert (fail: "failed to update DNS record"),
//!    then notify; a notification failure is logged and ignored
//!
//! Every step depends on the previous one, so the pass is strictly
//! sequential. Nothing is retried here: a failed run is retried by running
//! the process again.

use crate::error::Error;
use crate::ip::{IpAddress, is_valid_ip_address};
use crate::record::RecordStore;
use crate::telemetry::{Metric, Telemetry};
use crate::traits::{IpSource, Notifier, RecordType};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{Instrument, debug, error, info};

/// Record the reconciler keeps in sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Hosted zone identifier
    pub zone_id: String,
    /// Record name
    pub record_name: String,
}

impl RecordTarget {
    pub fn new(zone_id: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_name: record_name.into(),
        }
    }
}

/// Successful run outcome
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Record already pointed at the external IP, nothing written
    Unchanged {
        /// The current address
        ip: IpAddress,
    },

    /// Record was upserted (notification attempted)
    Updated {
        /// Value found in the record
        previous: IpAddress,
        /// Value written
        current: IpAddress,
        /// Provider change identifier
        change_id: String,
    },
}

impl Outcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Outcome::Updated { .. })
    }
}

/// Failed run, tagged with the step that failed
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("failed to retrieve external IP address: {0}")]
    ExternalIp(#[source] Error),

    #[error("failed to retrieve existing DNS record: {0}")]
    ExistingRecord(#[source] Error),

    #[error("failed to update DNS record: {0}")]
    Update(#[source] Error),

    /// Run-scoped cancellation observed mid-run
    #[error("run cancelled before completion")]
    Cancelled,
}

impl ReconcileError {
    /// Underlying collaborator error, if any
    pub fn cause(&self) -> Option<&Error> {
        match self {
            ReconcileError::ExternalIp(e)
            | ReconcileError::ExistingRecord(e)
            | ReconcileError::Update(e) => Some(e),
            ReconcileError::Cancelled => None,
        }
    }
}

/// Single-pass reconciler
///
/// All collaborators are handed in at construction time so tests can swap
/// any of them for fakes.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run()`] once
/// 3. Exit with the outcome
pub struct Reconciler {
    /// External IP resolver
    ip_source: Box<dyn IpSource>,

    /// Reader/writer for the target record
    records: RecordStore,

    /// Optional notifier (absent when no credentials are configured)
    notifier: Option<Box<dyn Notifier>>,

    /// Run counters
    telemetry: Arc<dyn Telemetry>,

    /// Zone and record to keep in sync
    target: RecordTarget,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` when the target zone or record name is empty
    pub fn new(
        ip_source: Box<dyn IpSource>,
        records: RecordStore,
        notifier: Option<Box<dyn Notifier>>,
        telemetry: Arc<dyn Telemetry>,
        target: RecordTarget,
    ) -> crate::Result<Self> {
        if target.zone_id.trim().is_empty() {
            return Err(Error::config("hosted zone id cannot be empty"));
        }
        if target.record_name.trim().is_empty() {
            return Err(Error::config("record name cannot be empty"));
        }

        Ok(Self {
            ip_source,
            records,
            notifier,
            telemetry,
            target,
        })
    }

    pub fn target(&self) -> &RecordTarget {
        &self.target
    }

    /// Run one reconciliation, cancelled by Ctrl-C/SIGINT
    pub async fn run(&self) -> Result<Outcome, ReconcileError> {
        let result = tokio::select! {
            result = self.reconcile() => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, aborting run");
                Err(ReconcileError::Cancelled)
            }
        };

        self.record_metrics(&result);
        result
    }

    /// Run one reconciliation, optionally cancelled by `shutdown_rx`
    ///
    /// Dropping the sender without sending does not cancel the run.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<Outcome, ReconcileError> {
        let result = match shutdown_rx {
            Some(rx) => {
                tokio::select! {
                    result = self.reconcile() => result,
                    Ok(()) = rx => {
                        info!("Shutdown signal received, aborting run");
                        Err(ReconcileError::Cancelled)
                    }
                }
            }
            None => self.reconcile().await,
        };

        self.record_metrics(&result);
        result
    }

    /// The reconciliation pass itself, without counters
    async fn reconcile(&self) -> Result<Outcome, ReconcileError> {
        let span = tracing::info_span!(
            "reconcile",
            zone_id = %self.target.zone_id,
            record_name = %self.target.record_name,
            provider = self.records.provider_name(),
        );

        self.reconcile_steps().instrument(span).await
    }

    async fn reconcile_steps(&self) -> Result<Outcome, ReconcileError> {
        let RecordTarget { zone_id, record_name } = &self.target;

        // Start -> ResolvedExternalIp
        let external_ip = self
            .ip_source
            .current()
            .await
            .map_err(ReconcileError::ExternalIp)?;
        debug!(ip_address = %external_ip, source = self.ip_source.source_name(), "Retrieved external ip address");

        // ResolvedExternalIp -> ReadExistingRecord
        let existing_value = self
            .records
            .get_record(zone_id, record_name, RecordType::for_address(&external_ip))
            .await
            .map_err(ReconcileError::ExistingRecord)?;
        let existing_ip = parse_record_value(&existing_value).map_err(ReconcileError::ExistingRecord)?;
        debug!(existing_ip_address = %existing_ip, "Retrieved existing ip address for dns record");

        // Decide
        if external_ip.same_address(&existing_ip) {
            debug!("Ip address has not changed");
            return Ok(Outcome::Unchanged { ip: external_ip });
        }

        if !is_valid_ip_address(external_ip.as_str()) {
            return Err(ReconcileError::Update(Error::validation(format!(
                "invalid IP address: {:?}",
                external_ip.as_str()
            ))));
        }

        let receipt = self
            .records
            .update_record(zone_id, record_name, external_ip.as_str())
            .await
            .map_err(ReconcileError::Update)?;
        info!(ip_address = %external_ip, previous_ip_address = %existing_ip, "Record updated");

        self.notify(record_name).await;

        Ok(Outcome::Updated {
            previous: existing_ip,
            current: external_ip,
            change_id: receipt.id,
        })
    }

    /// Best effort: failures are logged, never propagated
    async fn notify(&self, record_name: &str) {
        let Some(notifier) = &self.notifier else {
            debug!("No notifier configured, skipping notification");
            return;
        };

        match notifier.notify_record_updated(record_name).await {
            Ok(()) => debug!(notifier = notifier.notifier_name(), record_name, "Notification sent"),
            Err(e) => error!(
                notifier = notifier.notifier_name(),
                record_name,
                error = %e,
                "Failed to send notification"
            ),
        }
    }

    fn record_metrics(&self, result: &Result<Outcome, ReconcileError>) {
        match result {
            Ok(Outcome::Unchanged { .. }) => {
                self.telemetry.increment(Metric::IpAddressNotChanged);
                self.telemetry.increment(Metric::SuccessfulRuns);
            }
            Ok(Outcome::Updated { .. }) => {
                self.telemetry.increment(Metric::IpAddressChanged);
                self.telemetry.increment(Metric::SuccessfulRuns);
            }
            Err(_) => self.telemetry.increment(Metric::FailedRuns),
        }
    }
}

fn parse_record_value(value: &str) -> crate::Result<IpAddress> {
    if value.is_empty() {
        return Err(Error::validation(
            "record has no value when an IP address is expected",
        ));
    }

    IpAddress::parse(value)
        .map_err(|_| Error::validation(format!("invalid IP address in DNS record: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_names_the_failed_step() {
        let err = ReconcileError::ExistingRecord(Error::lookup(
            "no records found for hosted zone Z1 and record name home.example.com",
        ));

        assert_eq!(
            err.to_string(),
            "failed to retrieve existing DNS record: no records found for hosted zone Z1 and record name home.example.com"
        );
        assert!(matches!(err.cause(), Some(Error::Lookup(_))));
        assert_eq!(ReconcileError::Cancelled.cause(), None);
    }

    #[test]
    fn record_value_must_be_an_address() {
        assert!(parse_record_value("203.0.113.5").is_ok());

        let err = parse_record_value("home.example.net").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid IP address in DNS record: home.example.net"
        );

        let err = parse_record_value("").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
