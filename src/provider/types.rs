// ABOUTME: Plain data exchanged with cloud provider backends.
// ABOUTME: Stacks, change sets, events, hosted zones, records, certificates, distributions.

use chrono::{DateTime, Utc};

use crate::stack::{DeploymentOutputs, ParameterValue, StackStatus};
use crate::types::{ChangeSetId, DistributionId, HostedZoneId, StackName};

/// Capabilities acknowledged on every change set so templates may create
/// IAM resources and use macros.
pub const CAPABILITIES: [&str; 3] = [
    "CAPABILITY_IAM",
    "CAPABILITY_NAMED_IAM",
    "CAPABILITY_AUTO_EXPAND",
];

/// A stack as described by the provider.
#[derive(Debug, Clone)]
pub struct StackDescription {
    pub name: StackName,
    pub status: StackStatus,
    pub outputs: DeploymentOutputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetType {
    Create,
    Update,
}

impl ChangeSetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSetType::Create => "CREATE",
            ChangeSetType::Update => "UPDATE",
        }
    }
}

impl std::fmt::Display for ChangeSetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the provider needs to compute a change set.
#[derive(Debug, Clone)]
pub struct ChangeSetRequest {
    pub stack_name: StackName,
    pub change_set_name: String,
    pub change_set_type: ChangeSetType,
    pub description: String,
    pub template_body: String,
    pub parameters: Vec<ParameterValue>,
}

/// A change set as last described by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetDescription {
    pub id: ChangeSetId,
    pub status: String,
    pub status_reason: Option<String>,
}

/// A stack event, newest first in provider listings.
#[derive(Debug, Clone)]
pub struct StackEvent {
    pub logical_id: String,
    pub resource_status: String,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: HostedZoneId,
    /// Fully qualified, with trailing dot.
    pub name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub dns_name: String,
    pub hosted_zone_id: String,
    pub evaluate_target_health: bool,
}

/// A DNS record set in a hosted zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: String,
    pub ttl: Option<u64>,
    pub values: Vec<String>,
    pub alias_target: Option<AliasTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub arn: String,
    pub domain_name: String,
}

/// One page of issued certificates.
#[derive(Debug, Clone, Default)]
pub struct CertificatePage {
    pub certificates: Vec<CertificateSummary>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSummary {
    pub id: DistributionId,
    pub domain_name: String,
    pub aliases: Vec<String>,
    pub comment: Option<String>,
}
