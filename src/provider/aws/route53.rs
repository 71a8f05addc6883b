// ABOUTME: Route 53 hosted zone and record set operations through the aws tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AwsCli, args, input_file};
use crate::provider::{AliasTarget, HostedZone, ProviderError, RecordSet, ZoneOps};
use crate::types::HostedZoneId;

const SERVICE: &str = "route53";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListHostedZones {
    #[serde(default)]
    hosted_zones: Vec<HostedZoneJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZoneJson {
    id: String,
    name: String,
    config: Option<ZoneConfigJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneConfigJson {
    comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetHostedZone {
    delegation_set: Option<DelegationSetJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DelegationSetJson {
    #[serde(default)]
    name_servers: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListRecordSets {
    #[serde(default)]
    resource_record_sets: Vec<RecordSetJson>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RecordSetJson {
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    resource_records: Vec<ResourceRecordJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias_target: Option<AliasTargetJson>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceRecordJson {
    value: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AliasTargetJson {
    hosted_zone_id: String,
    #[serde(rename = "DNSName")]
    dns_name: String,
    #[serde(default)]
    evaluate_target_health: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeBatch {
    changes: Vec<Change>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Change {
    action: &'static str,
    resource_record_set: RecordSetJson,
}

impl From<RecordSetJson> for RecordSet {
    fn from(json: RecordSetJson) -> Self {
        RecordSet {
            name: json.name,
            record_type: json.record_type,
            ttl: json.ttl,
            values: json.resource_records.into_iter().map(|r| r.value).collect(),
            alias_target: json.alias_target.map(|a| AliasTarget {
                dns_name: a.dns_name,
                hosted_zone_id: a.hosted_zone_id,
                evaluate_target_health: a.evaluate_target_health,
            }),
        }
    }
}

impl From<&RecordSet> for RecordSetJson {
    fn from(record: &RecordSet) -> Self {
        RecordSetJson {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            ttl: record.ttl,
            resource_records: record
                .values
                .iter()
                .map(|value| ResourceRecordJson {
                    value: value.clone(),
                })
                .collect(),
            alias_target: record.alias_target.as_ref().map(|a| AliasTargetJson {
                hosted_zone_id: a.hosted_zone_id.clone(),
                dns_name: a.dns_name.clone(),
                evaluate_target_health: a.evaluate_target_health,
            }),
        }
    }
}

#[async_trait]
impl ZoneOps for AwsCli {
    async fn hosted_zones_by_name(&self, domain: &str) -> Result<Vec<HostedZone>, ProviderError> {
        let response: ListHostedZones = self
            .call_json(
                SERVICE,
                "list-hosted-zones-by-name",
                &args(["--dns-name", domain]),
            )
            .await?;

        Ok(response
            .hosted_zones
            .into_iter()
            .map(|zone| HostedZone {
                id: HostedZoneId::from_path(&zone.id),
                name: zone.name,
                comment: zone.config.and_then(|c| c.comment),
            })
            .collect())
    }

    async fn hosted_zone_nameservers(
        &self,
        id: &HostedZoneId,
    ) -> Result<Vec<String>, ProviderError> {
        let response: GetHostedZone = self
            .call_json(SERVICE, "get-hosted-zone", &args(["--id", id.as_str()]))
            .await?;

        Ok(response
            .delegation_set
            .map(|d| d.name_servers)
            .unwrap_or_default())
    }

    async fn record_sets(&self, id: &HostedZoneId) -> Result<Vec<RecordSet>, ProviderError> {
        let response: ListRecordSets = self
            .call_json(
                SERVICE,
                "list-resource-record-sets",
                &args(["--hosted-zone-id", id.as_str()]),
            )
            .await?;

        Ok(response
            .resource_record_sets
            .into_iter()
            .map(RecordSet::from)
            .collect())
    }

    async fn delete_record_sets(
        &self,
        id: &HostedZoneId,
        records: &[RecordSet],
    ) -> Result<(), ProviderError> {
        let batch = ChangeBatch {
            changes: records
                .iter()
                .map(|record| Change {
                    action: "DELETE",
                    resource_record_set: record.into(),
                })
                .collect(),
        };

        let (_file, batch_arg) = input_file(&batch)?;
        self.call(
            SERVICE,
            "change-resource-record-sets",
            &[
                "--hosted-zone-id".to_string(),
                id.as_str().to_string(),
                "--change-batch".to_string(),
                batch_arg,
            ],
        )
        .await?;
        Ok(())
    }
}
