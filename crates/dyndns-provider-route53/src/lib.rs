// # Route 53 DNS Provider
//
// Thin adapter from the `DnsProvider` trait onto the AWS Route 53 API.
//
// ## Behavior
//
// - `list_record_sets` = one `ListResourceRecordSets` call starting at the
//   given name/type; Route 53 returns sets in its own order from there
// - `upsert_record` = one `ChangeResourceRecordSets` call holding a single
//   `UPSERT`; propagation is not awaited
// - No retry, no caching, no decision about whether an update is needed
//
// ## Errors
//
// - Route 53 service errors keep their AWS code (`NoSuchHostedZone`,
//   `InvalidChangeBatch`, `PriorRequestNotComplete`, ...) as `Error::Provider`
// - Dispatch, timeout and response-parsing failures become `Error::Transport`
//
// ## Credentials
//
// Credentials and region come from the standard AWS provider chain; nothing
// credential-related is held or logged here.
//
// ## API Reference
//
// - ListResourceRecordSets: GET `/2013-04-01/hostedzone/{Id}/rrset`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset/`

use async_trait::async_trait;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ChangeInfo, ResourceRecord, ResourceRecordSet, RrType,
};
use dyndns_core::traits::{
    ChangeReceipt, DnsProvider, RecordChange, RecordSet, RecordSetQuery, RecordType,
};
use dyndns_core::{Error, Result};

const PROVIDER_NAME: &str = "route53";

/// Status reported for upserts skipped in dry-run mode
pub const DRY_RUN_STATUS: &str = "DRY_RUN";

/// Route 53 DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform the list call against Route 53
/// - Log the intended change batch
/// - **NOT** submit it, reporting the change as accepted with status `DRY_RUN`
pub struct Route53Provider {
    /// Route 53 API client
    client: aws_sdk_route53::Client,

    /// Dry-run mode: if true, list record sets but skip change batches
    dry_run: bool,
}

impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Route53Provider {
    /// Wrap an existing client
    pub fn new(client: aws_sdk_route53::Client, dry_run: bool) -> Self {
        if dry_run {
            tracing::warn!("Route 53 provider running in DRY-RUN mode - no changes will be made");
        }

        Self { client, dry_run }
    }

    /// Build a client from the default AWS provider chain for `region`
    pub async fn from_region(region: impl Into<String>, dry_run: bool) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;

        Self::new(aws_sdk_route53::Client::new(&sdk_config), dry_run)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_record_sets(&self, query: &RecordSetQuery) -> Result<Vec<RecordSet>> {
        tracing::debug!(
            zone_id = %query.zone_id,
            start_name = %query.start_name,
            start_type = %query.start_type,
            "Listing resource record sets"
        );

        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(&query.zone_id)
            .start_record_name(&query.start_name)
            .start_record_type(rr_type(query.start_type))
            .send()
            .await
            .map_err(|e| map_sdk_error("ListResourceRecordSets", e))?;

        let record_sets: Vec<RecordSet> = output
            .resource_record_sets
            .iter()
            .map(to_record_set)
            .collect();

        tracing::debug!(count = record_sets.len(), "Listed resource record sets");
        Ok(record_sets)
    }

    async fn upsert_record(&self, zone_id: &str, change: &RecordChange) -> Result<ChangeReceipt> {
        let change_batch = build_change_batch(change)
            .map_err(|e| Error::validation(format!("invalid change batch: {e}")))?;

        if self.dry_run {
            tracing::info!(
                zone_id,
                "[DRY-RUN] Would submit change batch: {}",
                serde_json::json!({
                    "Action": "UPSERT",
                    "Name": change.name,
                    "Type": change.record_type.as_str(),
                    "TTL": change.ttl,
                    "ResourceRecords": [{ "Value": change.value }],
                })
            );
            return Ok(ChangeReceipt {
                id: DRY_RUN_STATUS.to_string(),
                status: DRY_RUN_STATUS.to_string(),
            });
        }

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(change_batch)
            .send()
            .await
            .map_err(|e| map_sdk_error("ChangeResourceRecordSets", e))?;

        let receipt = to_receipt(output.change_info());

        tracing::debug!(change_id = %receipt.id, status = %receipt.status, "Change batch accepted");
        Ok(receipt)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn to_receipt<'a>(info: impl Into<Option<&'a ChangeInfo>>) -> ChangeReceipt {
    match info.into() {
        Some(info) => ChangeReceipt {
            id: info.id().to_string(),
            status: info.status().as_str().to_string(),
        },
        None => ChangeReceipt {
            id: String::new(),
            status: "UNKNOWN".to_string(),
        },
    }
}

fn rr_type(record_type: RecordType) -> RrType {
    match record_type {
        RecordType::A => RrType::A,
        RecordType::Aaaa => RrType::Aaaa,
    }
}

fn to_record_set(set: &ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: set.name.clone(),
        record_type: set.r#type.as_str().to_string(),
        ttl: set.ttl,
        values: set
            .resource_records
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|rr| rr.value.clone())
            .collect(),
    }
}

fn build_record_set(change: &RecordChange) -> std::result::Result<ResourceRecordSet, BuildError> {
    ResourceRecordSet::builder()
        .name(&change.name)
        .r#type(rr_type(change.record_type))
        .ttl(i64::from(change.ttl))
        .resource_records(ResourceRecord::builder().value(&change.value).build()?)
        .build()
}

fn build_change_batch(change: &RecordChange) -> std::result::Result<ChangeBatch, BuildError> {
    ChangeBatch::builder()
        .changes(
            Change::builder()
                .action(ChangeAction::Upsert)
                .resource_record_set(build_record_set(change)?)
                .build()?,
        )
        .build()
}

/// Service errors keep their AWS code; everything else is a transport failure
fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    if let Some(service_err) = err.as_service_error() {
        return Error::provider(
            PROVIDER_NAME,
            service_err.code().unwrap_or("Unknown"),
            service_err.message().unwrap_or_default(),
        );
    }

    Error::transport(format!("{operation} failed: {}", DisplayErrorContext(&err)))
}
