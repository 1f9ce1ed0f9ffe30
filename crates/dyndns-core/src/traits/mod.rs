//! Collaborator traits for the dynamic DNS updater
//!
//! The reconciler only ever talks to these interfaces; concrete HTTP, Route 53
//! and Pushover clients live in their own crates.
//!
//! - [`IpSource`]: Resolve the caller's public IP address
//! - [`DnsProvider`]: List record sets and submit upserts
//! - [`Notifier`]: Best-effort push notification after a change

pub mod ip_source;
pub mod dns_provider;
pub mod notifier;

pub use ip_source::IpSource;
pub use dns_provider::{ChangeReceipt, DnsProvider, RecordChange, RecordSet, RecordSetQuery, RecordType};
pub use notifier::Notifier;
