// ABOUTME: Composable capability traits for the cloud provider.
// ABOUTME: StackOps, ZoneOps, CertificateOps, CdnOps, BucketOps, and TxtResolver.

pub mod aws;
mod dig;
mod error;
mod types;

pub use dig::DigResolver;
pub use error::ProviderError;
pub use types::*;

use async_trait::async_trait;

use crate::types::{ChangeSetId, HostedZoneId, StackName};

/// Infrastructure stack and change set operations.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// Describe a stack. Returns [`ProviderError::NotFound`] when the stack
    /// does not exist.
    async fn describe_stack(&self, name: &StackName) -> Result<StackDescription, ProviderError>;

    /// Start computing a change set.
    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<ChangeSetId, ProviderError>;

    async fn describe_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, ProviderError>;

    async fn execute_change_set(
        &self,
        stack: &StackName,
        id: &ChangeSetId,
    ) -> Result<(), ProviderError>;

    async fn delete_change_set(&self, stack: &StackName, id: &ChangeSetId)
    -> Result<(), ProviderError>;

    /// Start deleting a stack, keeping the named logical resources.
    async fn delete_stack(&self, name: &StackName, retain: &[String]) -> Result<(), ProviderError>;

    /// Stack events, newest first.
    async fn stack_events(&self, name: &StackName) -> Result<Vec<StackEvent>, ProviderError>;
}

/// Hosted zone and record set operations.
#[async_trait]
pub trait ZoneOps: Send + Sync {
    /// Hosted zones whose name matches or follows `domain` in the provider's
    /// ordering. Callers filter for exact matches.
    async fn hosted_zones_by_name(&self, domain: &str) -> Result<Vec<HostedZone>, ProviderError>;

    async fn hosted_zone_nameservers(&self, id: &HostedZoneId)
    -> Result<Vec<String>, ProviderError>;

    async fn record_sets(&self, id: &HostedZoneId) -> Result<Vec<RecordSet>, ProviderError>;

    /// Delete record sets in one batch.
    async fn delete_record_sets(
        &self,
        id: &HostedZoneId,
        records: &[RecordSet],
    ) -> Result<(), ProviderError>;
}

/// TLS certificate lookups.
#[async_trait]
pub trait CertificateOps: Send + Sync {
    /// One page of issued certificates, starting at `next_token`.
    async fn issued_certificates(
        &self,
        next_token: Option<&str>,
    ) -> Result<CertificatePage, ProviderError>;
}

/// Content delivery network lookups.
#[async_trait]
pub trait CdnOps: Send + Sync {
    async fn distributions(&self) -> Result<Vec<DistributionSummary>, ProviderError>;
}

/// Object storage operations.
#[async_trait]
pub trait BucketOps: Send + Sync {
    /// Remove every object from a bucket.
    async fn empty_bucket(&self, bucket: &str) -> Result<(), ProviderError>;
}

/// Public DNS TXT lookups, used to observe delegation from outside the
/// provider.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    async fn resolve_txt(&self, domain: &str) -> Result<Vec<String>, ProviderError>;
}

/// Full provider capabilities required by the orchestrators.
pub trait CloudProvider: StackOps + ZoneOps + CertificateOps + CdnOps + BucketOps {}

impl<T> CloudProvider for T where T: StackOps + ZoneOps + CertificateOps + CdnOps + BucketOps {}
