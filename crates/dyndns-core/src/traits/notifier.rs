//! Notification trait

use async_trait::async_trait;

/// Trait for push-notification transports
///
/// Fire-and-forget from the reconciler's point of view: an `Err` is logged
/// and otherwise ignored. A deployment without notification credentials
/// simply has no notifier.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce that `record_name` now points at a new address
    async fn notify_record_updated(&self, record_name: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
