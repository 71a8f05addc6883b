// ABOUTME: Stack outputs that flow from one stack deploy into the next.
// ABOUTME: A flat string map keyed by template-defined output names.

use std::collections::BTreeMap;

/// Output names the choreography reads from stack templates.
pub mod keys {
    pub const STACK_NAME: &str = "StackName";
    pub const HOSTED_ZONE_ID: &str = "HostedZoneId";
    pub const HOSTED_ZONE_NAME: &str = "HostedZoneName";
    pub const CERTIFICATE_ARN: &str = "CertificateArn";
    pub const DISTRIBUTION_ID: &str = "DistributionId";
    pub const DISTRIBUTION_DOMAIN_NAME: &str = "DistributionDomainName";
    pub const BUCKET_NAME: &str = "BucketName";
    pub const URL: &str = "URL";
}

/// Outputs of a deployed stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOutputs(BTreeMap<String, String>);

impl DeploymentOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeploymentOutputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_and_reads_outputs() {
        let outputs: DeploymentOutputs =
            [(keys::BUCKET_NAME, "site-bucket"), (keys::URL, "https://example.com")]
                .into_iter()
                .collect();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.get(keys::BUCKET_NAME), Some("site-bucket"));
        assert_eq!(outputs.get(keys::DISTRIBUTION_ID), None);
    }
}
