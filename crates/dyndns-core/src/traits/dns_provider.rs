// # DNS Provider Trait
//
// Defines the two provider operations the updater depends on.
//
// ## Implementations
//
// - AWS Route 53: `dyndns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::traits::{DnsProvider, RecordSetQuery, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let sets = provider
//         .list_record_sets(&RecordSetQuery::new("Z0123456789", "home.example.com", RecordType::A))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Record type matching an address family
    pub fn for_address(ip: &crate::ip::IpAddress) -> Self {
        if ip.is_ipv6() { Self::Aaaa } else { Self::A }
    }

    /// Wire name of the type ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "List record sets starting at" query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetQuery {
    /// Hosted zone identifier
    pub zone_id: String,
    /// Name the listing starts at
    pub start_name: String,
    /// Type the listing starts at
    pub start_type: RecordType,
}

impl RecordSetQuery {
    pub fn new(zone_id: impl Into<String>, start_name: impl Into<String>, start_type: RecordType) -> Self {
        Self {
            zone_id: zone_id.into(),
            start_name: start_name.into(),
            start_type,
        }
    }
}

/// A record set as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Fully qualified name as stored by the provider (may carry a trailing dot)
    pub name: String,
    /// Record type as reported by the provider ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Time-to-live, if the provider reports one
    pub ttl: Option<i64>,
    /// Resource record values, in provider order
    pub values: Vec<String>,
}

/// A single create-or-replace change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Record name
    pub name: String,
    /// Address record type
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Exactly one value: the new address
    pub value: String,
}

/// Provider acknowledgement of an accepted change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReceipt {
    /// Provider change identifier
    pub id: String,
    /// Provider-reported status (e.g. "PENDING")
    pub status: String,
}

/// Trait for DNS provider implementations
///
/// Implementations are thin adapters over a provider API:
///
/// - One API call per method invocation, no retry or caching
/// - No decision about whether an update is needed (owned by the reconciler)
/// - Provider error codes are surfaced as [`crate::Error::Provider`], network
///   failures as [`crate::Error::Transport`]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List record sets in provider order, starting at the query's name/type
    ///
    /// Providers with "start at" semantics may return sets whose name follows
    /// the requested one; callers decide what to do with them.
    async fn list_record_sets(&self, query: &RecordSetQuery) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a change batch holding exactly one upsert
    ///
    /// Returns as soon as the provider accepts the change; propagation is not
    /// awaited.
    async fn upsert_record(
        &self,
        zone_id: &str,
        change: &RecordChange,
    ) -> Result<ChangeReceipt, crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "route53")
    fn provider_name(&self) -> &'static str;
}
