// ABOUTME: Named choreography steps, phases, and the per-step results reported to callers.
// ABOUTME: Progress is delivered as ProgressEvent values over a channel, never through UI callbacks.

use std::fmt;

use crate::stack::DeploymentOutputs;
use crate::types::StackKind;

/// A step of the deploy or destroy choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    DeployWeb,
    PublishAssets,
    DeployDomain,
    ValidateDns,
    DeployAlias,
    FinalizeWeb,
    EmptyBucket,
    DetachAlias,
    DeleteAlias,
    DeleteWeb,
    DeleteWebRetained,
    DeleteDomain,
    DeleteSupport,
}

impl Step {
    /// Steps of a deploy, in order.
    pub const DEPLOY: [Step; 6] = [
        Step::DeployWeb,
        Step::PublishAssets,
        Step::DeployDomain,
        Step::ValidateDns,
        Step::DeployAlias,
        Step::FinalizeWeb,
    ];

    /// Steps of a destroy, in order.
    pub const DESTROY: [Step; 7] = [
        Step::EmptyBucket,
        Step::DetachAlias,
        Step::DeleteAlias,
        Step::DeleteWeb,
        Step::DeleteWebRetained,
        Step::DeleteDomain,
        Step::DeleteSupport,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Step::DeployWeb => "Deploying web infrastructure",
            Step::PublishAssets => "Publishing site assets",
            Step::DeployDomain => "Setting up custom domain",
            Step::ValidateDns => "Validating custom domain DNS",
            Step::DeployAlias => "Setting up SSL",
            Step::FinalizeWeb => "Finalizing custom domain",
            Step::EmptyBucket => "Emptying site bucket",
            Step::DetachAlias => "Detaching custom domain",
            Step::DeleteAlias => "Deleting SSL and DNS alias",
            Step::DeleteWeb => "Deleting web infrastructure",
            Step::DeleteWebRetained => "Deleting web infrastructure, keeping edge functions",
            Step::DeleteDomain => "Deleting custom domain",
            Step::DeleteSupport => "Deleting shared support stack",
        }
    }

    /// Message shown to the user when the step fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Step::DeployWeb => "Failed to deploy your site",
            Step::PublishAssets => "Failed to push assets",
            Step::DeployDomain => "Failed to create your custom domain",
            Step::ValidateDns => "Failed to validate your custom domain",
            Step::DeployAlias => "Failed to setup SSL for your custom domain",
            Step::FinalizeWeb => "Failed to point custom domain at your site",
            Step::EmptyBucket => "Failed to empty the site bucket",
            Step::DeleteWeb => "First web stack delete did not complete",
            Step::DetachAlias
            | Step::DeleteAlias
            | Step::DeleteWebRetained
            | Step::DeleteDomain
            | Step::DeleteSupport => "Unable to delete site",
        }
    }

    /// Whether a failure of this step halts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Step::EmptyBucket | Step::DeleteWeb)
    }

    /// The stack whose events explain a failure of this step.
    pub fn stack_kind(&self) -> Option<StackKind> {
        match self {
            Step::DeployWeb
            | Step::FinalizeWeb
            | Step::DetachAlias
            | Step::DeleteWeb
            | Step::DeleteWebRetained => Some(StackKind::Web),
            Step::DeployDomain | Step::DeleteDomain => Some(StackKind::Domain),
            Step::DeployAlias | Step::DeleteAlias => Some(StackKind::Alias),
            Step::DeleteSupport => Some(StackKind::Support),
            Step::PublishAssets | Step::ValidateDns | Step::EmptyBucket => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observable choreography states of a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DeployingWeb,
    DomainPending,
    DomainDeployed,
    DnsValidating,
    DnsValidated,
    SettingUpAlias,
    FinalizingWeb,
    Finished,
}

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Human-readable summary of what could not be done.
    pub message: String,
    /// The provider's own failure reason, when one could be found.
    pub reason: Option<String>,
    /// The underlying error.
    pub cause: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}:\n\n{}", self.message, reason),
            None => write!(f, "{}: {}", self.message, self.cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure(StepFailure),
    Skipped,
}

/// The result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
    pub outputs: Option<DeploymentOutputs>,
}

impl StepReport {
    pub fn success(step: Step, outputs: Option<DeploymentOutputs>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Success,
            outputs,
        }
    }

    pub fn skipped(step: Step) -> Self {
        Self {
            step,
            outcome: StepOutcome::Skipped,
            outputs: None,
        }
    }

    pub fn failure(step: Step, failure: StepFailure) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failure(failure),
            outputs: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == StepOutcome::Success
    }
}

/// Progress of a run, streamed to the caller as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    PhaseChanged(Phase),
    StepStarted(Step),
    StepFinished(StepReport),
    /// Nameservers the registrar must delegate the domain to.
    Nameservers(Vec<String>),
}
