// ABOUTME: Read-only probes of existing DNS, certificate, and CDN resources for a domain.
// ABOUTME: Results only choose choreography branches; resources created by our own stacks are ignored.

use std::sync::Arc;
use tracing::{debug, info};

use crate::provider::{CloudProvider, DistributionSummary, HostedZone, ProviderError, RecordSet};
use crate::types::HostedZoneId;

/// Comment our own templates put on hosted zones and distributions.
pub const MANAGED_COMMENT: &str = "Created by hoist";

/// Suffix of CNAME targets the certificate authority uses for DNS validation.
pub const VALIDATION_RECORD_SUFFIX: &str = "acm-validations.aws.";

/// Append the trailing dot DNS APIs use for fully qualified names.
pub fn fully_qualified(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Resources that already exist for a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainResources {
    pub hosted_zone: Option<HostedZone>,
    pub certificate_arn: Option<String>,
    pub distribution: Option<DistributionSummary>,
    pub a_record: Option<RecordSet>,
}

pub struct ResourceDiscovery<P: CloudProvider + ?Sized> {
    provider: Arc<P>,
}

impl<P: CloudProvider + ?Sized> ResourceDiscovery<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Probe everything the choreography branches on.
    pub async fn discover(&self, domain: &str) -> Result<DomainResources, ProviderError> {
        let hosted_zone = self.find_hosted_zone(domain).await?;
        let certificate_arn = self.find_certificate_arn(domain).await?;
        let distribution = self.find_distribution(domain).await?;
        let a_record = match &hosted_zone {
            Some(zone) => self.find_a_record(&zone.id, domain).await?,
            None => None,
        };

        Ok(DomainResources {
            hosted_zone,
            certificate_arn,
            distribution,
            a_record,
        })
    }

    /// A hosted zone for exactly `domain` that our stacks did not create.
    pub async fn find_hosted_zone(&self, domain: &str) -> Result<Option<HostedZone>, ProviderError> {
        let wanted = fully_qualified(domain);
        let zone = self
            .provider
            .hosted_zones_by_name(domain)
            .await?
            .into_iter()
            .find(|zone| zone.name == wanted && !is_managed(zone.comment.as_deref()));

        match &zone {
            Some(zone) => debug!("found hosted zone {} for {}", zone.id, domain),
            None => debug!("no existing hosted zone for {}", domain),
        }
        Ok(zone)
    }

    /// An issued certificate for exactly `domain`, searching every page.
    pub async fn find_certificate_arn(&self, domain: &str) -> Result<Option<String>, ProviderError> {
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .provider
                .issued_certificates(next_token.as_deref())
                .await?;

            if let Some(cert) = page
                .certificates
                .into_iter()
                .find(|cert| cert.domain_name == domain)
            {
                debug!("found certificate {} for {}", cert.arn, domain);
                return Ok(Some(cert.arn));
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => {
                    debug!("no issued certificate for {}", domain);
                    return Ok(None);
                }
            }
        }
    }

    /// A distribution serving `domain` that our stacks did not create.
    pub async fn find_distribution(
        &self,
        domain: &str,
    ) -> Result<Option<DistributionSummary>, ProviderError> {
        let distribution = self
            .provider
            .distributions()
            .await?
            .into_iter()
            .find(|dist| {
                dist.aliases.iter().any(|alias| alias == domain)
                    && !is_managed(dist.comment.as_deref())
            });
        Ok(distribution)
    }

    /// The A record for `domain` in a hosted zone.
    pub async fn find_a_record(
        &self,
        zone: &HostedZoneId,
        domain: &str,
    ) -> Result<Option<RecordSet>, ProviderError> {
        let wanted = fully_qualified(domain);
        let record = self
            .provider
            .record_sets(zone)
            .await?
            .into_iter()
            .find(|record| record.record_type == "A" && record.name == wanted);
        Ok(record)
    }

    pub async fn hosted_zone_nameservers(
        &self,
        zone: &HostedZoneId,
    ) -> Result<Vec<String>, ProviderError> {
        self.provider.hosted_zone_nameservers(zone).await
    }

    pub async fn delete_records(
        &self,
        zone: &HostedZoneId,
        records: &[RecordSet],
    ) -> Result<(), ProviderError> {
        if records.is_empty() {
            return Ok(());
        }
        info!("deleting {} record(s) from {}", records.len(), zone);
        self.provider.delete_record_sets(zone, records).await
    }

    /// Delete the temporary CNAME records certificate validation leaves in a
    /// zone. Returns how many were removed.
    pub async fn cleanup_validation_records(
        &self,
        zone: &HostedZoneId,
    ) -> Result<usize, ProviderError> {
        let records: Vec<RecordSet> = self
            .provider
            .record_sets(zone)
            .await?
            .into_iter()
            .filter(is_validation_record)
            .collect();

        self.delete_records(zone, &records).await?;
        Ok(records.len())
    }
}

fn is_managed(comment: Option<&str>) -> bool {
    comment == Some(MANAGED_COMMENT)
}

fn is_validation_record(record: &RecordSet) -> bool {
    record.record_type == "CNAME"
        && record
            .values
            .iter()
            .any(|value| value.ends_with(VALIDATION_RECORD_SUFFIX))
}

/// Whether an A record aliases the distribution served at `distribution_domain`.
pub fn points_at(record: &RecordSet, distribution_domain: &str) -> bool {
    record
        .alias_target
        .as_ref()
        .is_some_and(|target| fully_qualified(&target.dns_name) == fully_qualified(distribution_domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AliasTarget;

    fn record(record_type: &str, values: &[&str], alias: Option<&str>) -> RecordSet {
        RecordSet {
            name: "example.com.".to_string(),
            record_type: record_type.to_string(),
            ttl: None,
            values: values.iter().map(|v| v.to_string()).collect(),
            alias_target: alias.map(|dns| AliasTarget {
                dns_name: dns.to_string(),
                hosted_zone_id: "Z2FDTNDATAQYW2".to_string(),
                evaluate_target_health: false,
            }),
        }
    }

    #[test]
    fn fully_qualified_adds_single_trailing_dot() {
        assert_eq!(fully_qualified("example.com"), "example.com.");
        assert_eq!(fully_qualified("example.com."), "example.com.");
    }

    #[test]
    fn validation_records_are_cnames_to_acm() {
        assert!(is_validation_record(&record(
            "CNAME",
            &["_x1.abc.acm-validations.aws."],
            None
        )));
        assert!(!is_validation_record(&record("CNAME", &["other.example.net."], None)));
        assert!(!is_validation_record(&record(
            "TXT",
            &["_x1.abc.acm-validations.aws."],
            None
        )));
    }

    #[test]
    fn points_at_ignores_trailing_dot_differences() {
        let a = record("A", &[], Some("d111.cloudfront.net."));
        assert!(points_at(&a, "d111.cloudfront.net"));
        assert!(!points_at(&a, "d222.cloudfront.net"));
        assert!(!points_at(&record("A", &["1.2.3.4"], None), "d111.cloudfront.net"));
    }

    #[test]
    fn managed_comment_detection() {
        assert!(is_managed(Some("Created by hoist")));
        assert!(!is_managed(Some("hand made")));
        assert!(!is_managed(None));
    }
}
