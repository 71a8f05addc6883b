// ABOUTME: Deploy choreography: web, assets, domain, DNS validation, alias, and web finalize.
// ABOUTME: Each step's outputs feed the next; any fatal failure halts the run with an enriched reason.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::{Orchestration, RunContext, StackSet};
use super::dns::{DnsValidation, contains_marker};
use super::error::{OrchestrationError, StepError};
use super::params::{alias_parameters, domain_parameters, web_parameters};
use super::step::{Phase, ProgressEvent, Step, StepReport};
use crate::diagnostics::Warning;
use crate::discovery::points_at;
use crate::events::{Command, EventKind};
use crate::provider::{CloudProvider, DigResolver, ProviderError, TxtResolver};
use crate::publish::{AssetPublisher, PublishRequest};
use crate::stack::{DeploymentOutputs, PollSchedule, StackLifecycleManager, outputs::keys};
use crate::types::{DistributionId, HostedZoneId, StackKind};

/// Result of a deploy run that did not fail.
#[derive(Debug, Clone)]
pub struct DeploySummary {
    pub reports: Vec<StepReport>,
    pub finished: bool,
    pub site_url: Option<String>,
    pub nameservers: Option<Vec<String>>,
    pub warnings: Vec<Warning>,
    pub web_outputs: DeploymentOutputs,
}

pub struct DeployOrchestrator<P: CloudProvider + ?Sized> {
    orchestration: Orchestration<P>,
    resolver: Arc<dyn TxtResolver>,
    publisher: Option<Arc<dyn AssetPublisher>>,
    dns: DnsValidation,
}

/// Templates and names for the stacks a deploy touches.
struct DeployStacks {
    web: StackSet,
    domain: Option<(String, StackSet, StackSet)>,
}

impl<P: CloudProvider + ?Sized> DeployOrchestrator<P> {
    pub fn new(orchestration: Orchestration<P>) -> Self {
        Self {
            orchestration,
            resolver: Arc::new(DigResolver::new()),
            publisher: None,
            dns: DnsValidation::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TxtResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Publish assets after the first web deploy. Without a publisher the
    /// step is skipped.
    pub fn with_publisher(mut self, publisher: Arc<dyn AssetPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_dns_validation(mut self, dns: DnsValidation) -> Self {
        self.dns = dns;
        self
    }

    /// Run the choreography to completion.
    pub async fn run(&self) -> Result<DeploySummary, OrchestrationError> {
        let orch = &self.orchestration;
        let stacks = self.prepare()?;
        let lifecycle = orch.lifecycle();
        let mut ctx = RunContext::new(stacks.domain.is_some());

        orch.record(EventKind::Started, Command::Deploy, None);

        // Web
        ctx.enter(orch, Phase::DeployingWeb);
        let result = self.deploy_web(&lifecycle, &stacks.web, &mut ctx, true).await;
        self.settle(&lifecycle, &mut ctx, Step::DeployWeb, result).await?;
        ctx.web_deployed = true;

        match &self.publisher {
            Some(publisher) => {
                let result = self.publish(publisher.as_ref(), &ctx).await;
                self.settle(&lifecycle, &mut ctx, Step::PublishAssets, result)
                    .await?;
            }
            None => ctx.push(orch, StepReport::skipped(Step::PublishAssets)),
        }
        ctx.assets_published = true;

        match &stacks.domain {
            None => {
                for step in [
                    Step::DeployDomain,
                    Step::ValidateDns,
                    Step::DeployAlias,
                    Step::FinalizeWeb,
                ] {
                    ctx.push(orch, StepReport::skipped(step));
                }
            }
            Some((domain, domain_stack, alias_stack)) => {
                ctx.enter(orch, Phase::DomainPending);
                let result = self
                    .deploy_domain(&lifecycle, domain, domain_stack, &mut ctx)
                    .await;
                self.settle(&lifecycle, &mut ctx, Step::DeployDomain, result)
                    .await?;
                ctx.domain_deployed = true;
                ctx.enter(orch, Phase::DomainDeployed);

                ctx.enter(orch, Phase::DnsValidating);
                let result = self.validate_dns(domain, &mut ctx).await;
                self.settle(&lifecycle, &mut ctx, Step::ValidateDns, result)
                    .await?;
                ctx.dns_validated = true;
                ctx.enter(orch, Phase::DnsValidated);

                ctx.enter(orch, Phase::SettingUpAlias);
                let result = self
                    .deploy_alias(&lifecycle, domain, domain_stack, &stacks.web, alias_stack, &mut ctx)
                    .await;
                self.settle(&lifecycle, &mut ctx, Step::DeployAlias, result)
                    .await?;
                ctx.alias_deployed = true;

                if ctx.needs_redeploy {
                    ctx.enter(orch, Phase::FinalizingWeb);
                    let result = self.deploy_web(&lifecycle, &stacks.web, &mut ctx, false).await;
                    self.settle(&lifecycle, &mut ctx, Step::FinalizeWeb, result)
                        .await?;
                    ctx.web_finalized = true;
                } else {
                    ctx.push(orch, StepReport::skipped(Step::FinalizeWeb));
                }
            }
        }

        let finished = ctx.is_finished();
        if finished {
            ctx.enter(orch, Phase::Finished);
            orch.record(EventKind::Finished, Command::Deploy, None);
        }

        Ok(DeploySummary {
            reports: ctx.reports,
            finished,
            site_url: ctx.web_outputs.get(keys::URL).map(String::from),
            nameservers: ctx.nameservers,
            warnings: ctx.diagnostics.into_warnings(),
            web_outputs: ctx.web_outputs,
        })
    }

    /// Resolve names, templates and the publish directory before touching
    /// anything remote.
    fn prepare(&self) -> Result<DeployStacks, OrchestrationError> {
        let orch = &self.orchestration;

        if self.publisher.is_some() && !orch.site.dir.is_dir() {
            return Err(OrchestrationError::config(format!(
                "publish directory {} does not exist",
                orch.site.dir.display()
            )));
        }

        let web = StackSet {
            name: orch.stack_name(StackKind::Web)?,
            template: orch.template(StackKind::Web)?,
        };

        let domain = match &orch.site.domain {
            None => None,
            Some(domain) => {
                let domain_stack = StackSet {
                    name: orch.stack_name(StackKind::Domain)?,
                    template: orch.template(StackKind::Domain)?,
                };
                let alias_stack = StackSet {
                    name: orch.stack_name(StackKind::Alias)?,
                    template: orch.template(StackKind::Alias)?,
                };
                Some((domain.clone(), domain_stack, alias_stack))
            }
        };

        Ok(DeployStacks { web, domain })
    }

    /// Record a step's result. Fatal failures become the run's error.
    async fn settle(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        ctx: &mut RunContext,
        step: Step,
        result: Result<Option<DeploymentOutputs>, StepError>,
    ) -> Result<(), OrchestrationError> {
        let orch = &self.orchestration;
        match result {
            Ok(outputs) => {
                info!("{} succeeded", step);
                ctx.push(orch, StepReport::success(step, outputs));
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                info!("{} cancelled", step);
                Err(OrchestrationError::Cancelled)
            }
            Err(e) if e.is_configuration() => {
                orch.record(EventKind::Error, Command::Deploy, Some(e.to_string()));
                Err(OrchestrationError::config(e.to_string()))
            }
            Err(e) => {
                orch.record(EventKind::Error, Command::Deploy, Some(e.to_string()));
                let failure = orch.describe_failure(lifecycle, step, &e).await;
                ctx.push(orch, StepReport::failure(step, failure.clone()));
                Err(OrchestrationError::Step { step, failure })
            }
        }
    }

    /// Deploy the web stack. Certificate and distribution are probed on every
    /// pass; whether a second pass is needed is decided on the first.
    async fn deploy_web(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        web: &StackSet,
        ctx: &mut RunContext,
        first_pass: bool,
    ) -> Result<Option<DeploymentOutputs>, StepError> {
        let orch = &self.orchestration;
        let step = if first_pass {
            Step::DeployWeb
        } else {
            Step::FinalizeWeb
        };
        orch.emit(ProgressEvent::StepStarted(step));

        let (certificate_arn, existing_distribution) = match &orch.site.domain {
            Some(domain) => {
                let discovery = orch.discovery();
                let certificate =
                    probed("certificate", domain, discovery.find_certificate_arn(domain).await);
                let distribution =
                    probed("distribution", domain, discovery.find_distribution(domain).await);
                (certificate, distribution.is_some())
            }
            None => (None, false),
        };

        if first_pass && ctx.has_custom_domain {
            ctx.needs_redeploy = certificate_arn.is_none() || existing_distribution;
            debug!("second web deploy needed: {}", ctx.needs_redeploy);
        }

        let parameters = web_parameters(
            &orch.site,
            certificate_arn.as_deref(),
            existing_distribution,
        );
        let outputs = lifecycle.deploy(&web.descriptor(parameters)).await?;
        ctx.web_outputs = outputs.clone();
        Ok(Some(outputs))
    }

    async fn publish(
        &self,
        publisher: &dyn AssetPublisher,
        ctx: &RunContext,
    ) -> Result<Option<DeploymentOutputs>, StepError> {
        let orch = &self.orchestration;
        orch.emit(ProgressEvent::StepStarted(Step::PublishAssets));
        orch.cancel.check()?;

        let bucket = ctx
            .web_outputs
            .get(keys::BUCKET_NAME)
            .ok_or_else(|| StepError::Invalid("web stack has no BucketName output".to_string()))?;

        let request = PublishRequest {
            dir: orch.site.dir.clone(),
            bucket: bucket.to_string(),
            distribution: ctx.web_outputs.get(keys::DISTRIBUTION_ID).map(DistributionId::new),
        };
        publisher.publish(&request).await?;
        Ok(None)
    }

    async fn deploy_domain(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        domain: &str,
        stack: &StackSet,
        ctx: &mut RunContext,
    ) -> Result<Option<DeploymentOutputs>, StepError> {
        let orch = &self.orchestration;
        orch.emit(ProgressEvent::StepStarted(Step::DeployDomain));

        let zone = probed(
            "hosted zone",
            domain,
            orch.discovery().find_hosted_zone(domain).await,
        );
        let parameters = domain_parameters(domain, zone.as_ref().map(|z| &z.id));
        let outputs = lifecycle.deploy(&stack.descriptor(parameters)).await?;
        ctx.domain_outputs = outputs.clone();
        Ok(Some(outputs))
    }

    /// Poll public DNS until the ownership marker shows up. After the first
    /// miss the zone's nameservers are fetched once and surfaced so the
    /// operator can update their registrar.
    async fn validate_dns(
        &self,
        domain: &str,
        ctx: &mut RunContext,
    ) -> Result<Option<DeploymentOutputs>, StepError> {
        let orch = &self.orchestration;
        orch.emit(ProgressEvent::StepStarted(Step::ValidateDns));

        let deadline = PollSchedule::new(self.dns.interval, self.dns.timeout).start();
        let mut attempt: u32 = 0;
        let mut lookup_failed = false;

        loop {
            orch.cancel.check()?;
            attempt += 1;

            match self.resolver.resolve_txt(domain).await {
                Ok(records) if contains_marker(&records, &self.dns.marker) => {
                    info!("DNS for {} validated after {} attempt(s)", domain, attempt);
                    return Ok(None);
                }
                Ok(_) => debug!("attempt {}: no {} record for {}", attempt, self.dns.marker, domain),
                // A resolver that cannot run will never succeed
                Err(e @ ProviderError::Spawn { .. }) => return Err(e.into()),
                Err(e) if !lookup_failed => {
                    warn!("TXT lookup for {} failed, retrying: {}", domain, e);
                    lookup_failed = true;
                }
                Err(e) => debug!("attempt {}: TXT lookup for {} failed: {}", attempt, domain, e),
            }

            if self.dns.exhausted(attempt) {
                return Err(StepError::Invalid(format!(
                    "{} did not resolve to the new nameservers after {} attempts",
                    domain, attempt
                )));
            }
            if deadline.expired() {
                return Err(StepError::Invalid(format!(
                    "{} did not resolve to the new nameservers within {:?}",
                    domain,
                    deadline.elapsed()
                )));
            }

            if ctx.nameservers.is_none() {
                let zone = hosted_zone_id(&ctx.domain_outputs)?;
                match orch.discovery().hosted_zone_nameservers(&zone).await {
                    Ok(nameservers) => {
                        info!("configure your registrar with: {}", nameservers.join(", "));
                        orch.emit(ProgressEvent::Nameservers(nameservers.clone()));
                        ctx.nameservers = Some(nameservers);
                    }
                    // Retried after the next miss
                    Err(e) => warn!("could not fetch nameservers for {}: {}", zone, e),
                }
            }

            orch.cancel.sleep(self.dns.interval).await?;
        }
    }

    async fn deploy_alias(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        domain: &str,
        domain_stack: &StackSet,
        web_stack: &StackSet,
        alias_stack: &StackSet,
        ctx: &mut RunContext,
    ) -> Result<Option<DeploymentOutputs>, StepError> {
        let orch = &self.orchestration;
        orch.emit(ProgressEvent::StepStarted(Step::DeployAlias));

        let zone = hosted_zone_id(&ctx.domain_outputs)?;
        let discovery = orch.discovery();

        let existing = probed("A record", domain, discovery.find_a_record(&zone, domain).await);
        if let Some(record) = existing {
            let current = ctx
                .web_outputs
                .get(keys::DISTRIBUTION_DOMAIN_NAME)
                .unwrap_or_default();
            if !points_at(&record, current) {
                info!("removing stale A record for {}", domain);
                discovery.delete_records(&zone, &[record]).await?;
            }
        }

        let parameters = alias_parameters(
            &orch.site,
            &domain_stack.name,
            &ctx.domain_outputs,
            &web_stack.name,
            &ctx.web_outputs,
        );
        let outputs = lifecycle.deploy(&alias_stack.descriptor(parameters)).await?;
        ctx.alias_outputs = outputs.clone();

        match discovery.cleanup_validation_records(&zone).await {
            Ok(0) => {}
            Ok(count) => debug!("removed {} validation record(s)", count),
            Err(e) => ctx.diagnostics.warn(Warning::record_cleanup(format!(
                "could not remove certificate validation records: {}",
                e
            ))),
        }

        Ok(Some(outputs))
    }

    pub fn orchestration(&self) -> &Orchestration<P> {
        &self.orchestration
    }
}

/// Probe results only choose a branch, so a failed probe counts as nothing
/// found.
fn probed<T>(what: &str, domain: &str, result: Result<Option<T>, ProviderError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("could not look up {} for {}: {}", what, domain, e);
        None
    })
}

fn hosted_zone_id(domain_outputs: &DeploymentOutputs) -> Result<HostedZoneId, StepError> {
    domain_outputs
        .get(keys::HOSTED_ZONE_ID)
        .map(HostedZoneId::from_path)
        .ok_or_else(|| StepError::Invalid("domain stack has no HostedZoneId output".to_string()))
}
