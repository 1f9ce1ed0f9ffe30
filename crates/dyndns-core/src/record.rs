//! DNS record reader and writer
//!
//! [`RecordStore`] turns the two raw provider operations into the
//! "read the current value" / "upsert a new value" pair the reconciler needs,
//! with the lookup and validation rules applied in one place.

use crate::error::{Error, Result};
use crate::ip::{IpAddress, is_valid_ip_address};
use crate::traits::{ChangeReceipt, DnsProvider, RecordChange, RecordSet, RecordSetQuery, RecordType};
use std::net::IpAddr;

/// TTL written with every upsert, in seconds
pub const RECORD_TTL_SECS: u32 = 1800;

/// How a selected record set whose name or type differs from the target is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    /// Take the first set the provider returns, warn on mismatch
    #[default]
    FirstReturned,
    /// Reject a first set that is not exactly the target
    Exact,
}

/// Reader/writer for a single address record
pub struct RecordStore {
    provider: Box<dyn DnsProvider>,
    name_match: NameMatch,
}

impl RecordStore {
    pub fn new(provider: Box<dyn DnsProvider>) -> Self {
        Self {
            provider,
            name_match: NameMatch::default(),
        }
    }

    /// Set the mismatch policy for the selected record set
    pub fn with_name_match(mut self, name_match: NameMatch) -> Self {
        self.name_match = name_match;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Read the first value of the first record set for `(zone_id, record_name)`.
    ///
    /// The value is returned unvalidated.
    ///
    /// # Errors
    ///
    /// - no record sets returned: `Lookup` ("no records found ...")
    /// - first set has no values: `Lookup` ("no resource records found ...")
    /// - provider/transport failures are propagated unchanged
    pub async fn get_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<String> {
        let query = RecordSetQuery::new(zone_id, record_name, record_type);
        let record_sets = self.provider.list_record_sets(&query).await?;

        tracing::debug!(
            provider = self.provider.provider_name(),
            count = record_sets.len(),
            "listed record sets: {:?}",
            record_sets
        );

        // First set in provider order wins
        let Some(record_set) = record_sets.into_iter().next() else {
            return Err(Error::lookup(format!(
                "no records found for hosted zone {zone_id} and record name {record_name}"
            )));
        };

        self.check_selected(&record_set, record_name, record_type)?;

        record_set.values.into_iter().next().ok_or_else(|| {
            Error::lookup(format!(
                "no resource records found for hosted zone {zone_id} and record name {record_name}"
            ))
        })
    }

    /// Upsert `ip_address` as the single value of `record_name`.
    ///
    /// The address is validated again here because the write is destructive.
    /// The record type follows the address family; an IPv4-mapped IPv6
    /// literal is written as its dotted-quad form in an A record.
    pub async fn update_record(
        &self,
        zone_id: &str,
        record_name: &str,
        ip_address: &str,
    ) -> Result<ChangeReceipt> {
        if !is_valid_ip_address(ip_address) {
            return Err(Error::validation(format!("invalid IP address: {ip_address:?}")));
        }
        let ip = IpAddress::parse(ip_address)?;
        let (record_type, value) = match ip.addr().to_canonical() {
            IpAddr::V4(v4) => (RecordType::A, v4.to_string()),
            IpAddr::V6(_) => (RecordType::Aaaa, ip.as_str().to_string()),
        };

        let change = RecordChange {
            name: record_name.to_string(),
            record_type,
            ttl: RECORD_TTL_SECS,
            value,
        };

        let receipt = self.provider.upsert_record(zone_id, &change).await?;

        tracing::info!(
            record_name,
            ip_address = %change.value,
            change_id = %receipt.id,
            status = %receipt.status,
            "Updated record successfully"
        );

        Ok(receipt)
    }

    fn check_selected(
        &self,
        record_set: &RecordSet,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<()> {
        let name_matches = same_record_name(&record_set.name, record_name);
        let type_matches = record_set.record_type.eq_ignore_ascii_case(record_type.as_str());

        if name_matches && type_matches {
            return Ok(());
        }

        match self.name_match {
            NameMatch::FirstReturned => {
                tracing::warn!(
                    target_name = record_name,
                    target_type = %record_type,
                    selected_name = %record_set.name,
                    selected_type = %record_set.record_type,
                    "first record set returned by provider does not match the target record"
                );
                Ok(())
            }
            NameMatch::Exact => Err(Error::lookup(format!(
                "no exact match for record {record_name} ({record_type}): provider returned {} ({})",
                record_set.name, record_set.record_type
            ))),
        }
    }
}

/// DNS names compare case-insensitively, with or without the root dot
fn same_record_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.').eq_ignore_ascii_case(b.trim_end_matches('.'))
}
