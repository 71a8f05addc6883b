// ABOUTME: Collaborators shared by deploy and destroy runs, and the per-run state threaded through steps.
// ABOUTME: Run state lives in explicit fields rather than ambient flags.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{OrchestrationError, StepError};
use super::params::SiteSettings;
use super::step::{Phase, ProgressEvent, Step, StepFailure, StepReport};
use crate::cancel::Cancellation;
use crate::diagnostics::Diagnostics;
use crate::discovery::ResourceDiscovery;
use crate::events::{AnalyticsEvent, Command, EventKind, EventReporter, NoopReporter};
use crate::provider::CloudProvider;
use crate::stack::{
    DeploymentOutputs, PollSchedule, StackDescriptor, StackLifecycleManager, StackParameters,
    Template, TemplateSource,
};
use crate::types::{StackKind, StackName, StackNaming};

/// Poll schedules for stack and change set waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSettings {
    pub stack: PollSchedule,
    pub change_set: PollSchedule,
}

impl Default for PollingSettings {
    fn default() -> Self {
        use std::time::Duration;
        Self {
            stack: PollSchedule::new(Duration::from_secs(5), Some(Duration::from_secs(60 * 60))),
            change_set: PollSchedule::new(
                Duration::from_secs(2),
                Some(Duration::from_secs(10 * 60)),
            ),
        }
    }
}

/// Everything a deploy or destroy run talks to.
pub struct Orchestration<P: CloudProvider + ?Sized> {
    pub(crate) provider: Arc<P>,
    pub(crate) templates: Arc<dyn TemplateSource>,
    pub(crate) naming: StackNaming,
    pub(crate) site: SiteSettings,
    pub(crate) reporter: Arc<dyn EventReporter>,
    pub(crate) progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
    pub(crate) polling: PollingSettings,
    pub(crate) cancel: Cancellation,
    pub(crate) session: Uuid,
}

impl<P: CloudProvider + ?Sized> Orchestration<P> {
    pub fn new(
        provider: Arc<P>,
        templates: Arc<dyn TemplateSource>,
        naming: StackNaming,
        site: SiteSettings,
    ) -> Self {
        Self {
            provider,
            templates,
            naming,
            site,
            reporter: Arc::new(NoopReporter),
            progress: None,
            polling: PollingSettings::default(),
            cancel: Cancellation::new(),
            session: Uuid::new_v4(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EventReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stream progress events to `sender`.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_polling(mut self, polling: PollingSettings) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    pub(crate) fn lifecycle(&self) -> StackLifecycleManager<P> {
        StackLifecycleManager::new(
            Arc::clone(&self.provider),
            self.polling.stack,
            self.polling.change_set,
            self.cancel.clone(),
        )
    }

    pub(crate) fn discovery(&self) -> ResourceDiscovery<P> {
        ResourceDiscovery::new(Arc::clone(&self.provider))
    }

    pub(crate) fn stack_name(&self, kind: StackKind) -> Result<StackName, OrchestrationError> {
        self.naming
            .stack_name(kind)
            .map_err(|e| OrchestrationError::config(e.to_string()))
    }

    pub(crate) fn template(&self, kind: StackKind) -> Result<Arc<Template>, OrchestrationError> {
        self.templates
            .load(kind)
            .map_err(|e| OrchestrationError::config(e.to_string()))
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            let _ = sender.send(event);
        }
    }

    pub(crate) fn record(&self, kind: EventKind, command: Command, detail: Option<String>) {
        let mut event = AnalyticsEvent::new(kind, command, self.session)
            .with_domain(self.site.domain.as_deref());
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.reporter.record(event);
    }

    /// Turn a step error into a failure report, enriched with the provider's
    /// most recent failure reason for the step's stack.
    pub(crate) async fn describe_failure(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        step: Step,
        error: &StepError,
    ) -> StepFailure {
        let reason = match step.stack_kind().map(|kind| self.naming.stack_name(kind)) {
            Some(Ok(stack)) => match lifecycle.latest_failure_reason(&stack).await {
                Ok(reason) => reason,
                Err(e) => {
                    warn!("could not read failure reason for {}: {}", stack, e);
                    None
                }
            },
            _ => None,
        };

        StepFailure {
            message: step.failure_message().to_string(),
            reason,
            cause: error.to_string(),
        }
    }
}

/// Handles for the stacks of one run.
pub(crate) struct StackSet {
    pub name: StackName,
    pub template: Arc<Template>,
}

impl StackSet {
    pub fn descriptor(&self, parameters: StackParameters) -> StackDescriptor {
        StackDescriptor::new(self.name.clone(), Arc::clone(&self.template), parameters)
    }
}

/// Mutable state of one deploy run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub has_custom_domain: bool,
    pub web_outputs: DeploymentOutputs,
    pub domain_outputs: DeploymentOutputs,
    pub alias_outputs: DeploymentOutputs,
    /// A second web deploy must feed the certificate back into the web stack.
    pub needs_redeploy: bool,
    /// Nameservers shown to the operator; fetched at most once per run.
    pub nameservers: Option<Vec<String>>,
    pub web_deployed: bool,
    pub assets_published: bool,
    pub domain_deployed: bool,
    pub dns_validated: bool,
    pub alias_deployed: bool,
    pub web_finalized: bool,
    pub phase: Option<Phase>,
    pub reports: Vec<StepReport>,
    pub diagnostics: Diagnostics,
}

impl RunContext {
    pub fn new(has_custom_domain: bool) -> Self {
        Self {
            has_custom_domain,
            ..Self::default()
        }
    }

    /// Web is deployed and published, and the custom domain (if any) is
    /// fully wired.
    pub fn is_finished(&self) -> bool {
        self.web_deployed
            && self.assets_published
            && (!self.has_custom_domain
                || self.web_finalized
                || (!self.needs_redeploy && self.alias_deployed))
    }

    pub(crate) fn enter<P: CloudProvider + ?Sized>(
        &mut self,
        orchestration: &Orchestration<P>,
        phase: Phase,
    ) {
        info!("phase: {:?}", phase);
        self.phase = Some(phase);
        orchestration.emit(ProgressEvent::PhaseChanged(phase));
    }

    pub(crate) fn push<P: CloudProvider + ?Sized>(
        &mut self,
        orchestration: &Orchestration<P>,
        report: StepReport,
    ) {
        orchestration.emit(ProgressEvent::StepFinished(report.clone()));
        self.reports.push(report);
    }
}
