// ABOUTME: CloudFront distribution listing through the aws tool.

use async_trait::async_trait;
use serde::Deserialize;

use super::AwsCli;
use crate::provider::{CdnOps, DistributionSummary, ProviderError};
use crate::types::DistributionId;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListDistributions {
    distribution_list: Option<DistributionListJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionListJson {
    #[serde(default)]
    items: Vec<DistributionJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionJson {
    id: String,
    domain_name: String,
    comment: Option<String>,
    aliases: Option<AliasesJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliasesJson {
    #[serde(default)]
    items: Vec<String>,
}

#[async_trait]
impl CdnOps for AwsCli {
    async fn distributions(&self) -> Result<Vec<DistributionSummary>, ProviderError> {
        let response: ListDistributions = self
            .call_json("cloudfront", "list-distributions", &[])
            .await?;

        Ok(response
            .distribution_list
            .map(|list| list.items)
            .unwrap_or_default()
            .into_iter()
            .map(|d| DistributionSummary {
                id: DistributionId::new(d.id),
                domain_name: d.domain_name,
                aliases: d.aliases.map(|a| a.items).unwrap_or_default(),
                comment: d.comment.filter(|c| !c.is_empty()),
            })
            .collect())
    }
}
