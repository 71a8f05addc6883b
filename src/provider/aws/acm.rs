// ABOUTME: ACM certificate listing through the aws tool, one page per call.

use async_trait::async_trait;
use serde::Deserialize;

use super::{AwsCli, CERTIFICATE_REGION, args};
use crate::provider::{CertificateOps, CertificatePage, CertificateSummary, ProviderError};

const PAGE_SIZE: &str = "100";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListCertificates {
    #[serde(default)]
    certificate_summary_list: Vec<CertificateJson>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateJson {
    certificate_arn: String,
    #[serde(default)]
    domain_name: String,
}

#[async_trait]
impl CertificateOps for AwsCli {
    async fn issued_certificates(
        &self,
        next_token: Option<&str>,
    ) -> Result<CertificatePage, ProviderError> {
        let mut arguments = args(["--certificate-statuses", "ISSUED", "--max-items", PAGE_SIZE]);
        if let Some(token) = next_token {
            arguments.push("--starting-token".to_string());
            arguments.push(token.to_string());
        }

        let stdout = self
            .call_in(CERTIFICATE_REGION, "acm", "list-certificates", &arguments)
            .await?;
        let response: ListCertificates = super::parse_json("acm", "list-certificates", &stdout)?;

        Ok(CertificatePage {
            certificates: response
                .certificate_summary_list
                .into_iter()
                .map(|c| CertificateSummary {
                    arn: c.certificate_arn,
                    domain_name: c.domain_name,
                })
                .collect(),
            next_token: response.next_token.filter(|t| !t.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_token() {
        let json = r#"{"CertificateSummaryList":[{"CertificateArn":"arn:aws:acm:us-east-1:1:certificate/a","DomainName":"example.com"}],"NextToken":"abc"}"#;
        let parsed: ListCertificates = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.certificate_summary_list[0].domain_name, "example.com");
        assert_eq!(parsed.next_token.as_deref(), Some("abc"));
    }
}
