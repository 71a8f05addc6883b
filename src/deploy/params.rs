// ABOUTME: Site settings and the parameter sets each stack is deployed with.
// ABOUTME: Unset values are left out so template defaults apply.

use std::path::PathBuf;

use crate::stack::{DeploymentOutputs, StackParameters, outputs::keys};
use crate::types::{HostedZoneId, StackName};

/// Publish behavior of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    /// Directory published to the bucket.
    pub dir: PathBuf,
    pub domain: Option<String>,
    pub redirect_www: bool,
    pub index_document: String,
    pub error_document: String,
    /// Serve the index document for unknown paths.
    pub spa: bool,
    /// Content-Security-Policy header value, passed through as-is.
    pub csp: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
            domain: None,
            redirect_www: false,
            index_document: "index.html".to_string(),
            error_document: "404.html".to_string(),
            spa: false,
            csp: None,
        }
    }
}

impl SiteSettings {
    pub fn has_custom_domain(&self) -> bool {
        self.domain.is_some()
    }

    fn redirect_prefix(&self) -> Option<&'static str> {
        self.redirect_www.then_some("www.")
    }

    fn error_object(&self) -> &str {
        if self.spa {
            &self.index_document
        } else {
            &self.error_document
        }
    }

    fn error_response_code(&self) -> &'static str {
        if self.spa { "200" } else { "404" }
    }
}

/// Parameters for the web stack.
///
/// CDN aliasing is only enabled when a certificate exists and no other
/// distribution already claims the domain.
pub fn web_parameters(
    site: &SiteSettings,
    certificate_arn: Option<&str>,
    existing_distribution: bool,
) -> StackParameters {
    let include_alias = certificate_arn.is_some() && !existing_distribution;

    StackParameters::new()
        .set("DomainName", site.domain.as_deref())
        .set("RedirectSubDomainNameWithDot", site.redirect_prefix())
        .set("DefaultRootObject", Some(site.index_document.as_str()))
        .set("DefaultErrorObject", Some(site.error_object()))
        .set("DefaultErrorResponseCode", Some(site.error_response_code()))
        .set("ExistingCertificate", certificate_arn)
        .set(
            "IncludeCloudFrontAlias",
            Some(if include_alias { "true" } else { "false" }),
        )
        .set("ContentSecurityPolicy", site.csp.as_deref())
}

/// Parameters for the domain stack, reusing an existing hosted zone.
pub fn domain_parameters(domain: &str, existing_zone: Option<&HostedZoneId>) -> StackParameters {
    StackParameters::new()
        .set("Name", Some(domain))
        .set("ExistingHostedZoneId", existing_zone.map(HostedZoneId::as_str))
}

/// Parameters for the alias stack, wired to the domain and web stacks.
pub fn alias_parameters(
    site: &SiteSettings,
    domain_stack: &StackName,
    domain_outputs: &DeploymentOutputs,
    web_stack: &StackName,
    web_outputs: &DeploymentOutputs,
) -> StackParameters {
    let domain_name = domain_outputs
        .get(keys::STACK_NAME)
        .unwrap_or(domain_stack.as_str());
    let web_name = web_outputs
        .get(keys::STACK_NAME)
        .unwrap_or(web_stack.as_str());

    StackParameters::new()
        .set("DomainStack", Some(domain_name))
        .set("WebStack", Some(web_name))
        .set("RedirectSubDomainNameWithDot", site.redirect_prefix())
}
