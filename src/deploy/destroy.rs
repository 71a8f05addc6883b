// ABOUTME: Destroy choreography: drain the bucket, detach the alias, then delete stacks in dependency order.
// ABOUTME: The web stack is deleted twice; the second pass keeps edge functions that are still replicating.

use tracing::info;

use super::context::{Orchestration, StackSet};
use super::error::{OrchestrationError, StepError};
use super::params::web_parameters;
use super::step::{ProgressEvent, Step, StepReport};
use crate::diagnostics::{Diagnostics, Warning};
use crate::events::{Command, EventKind};
use crate::provider::CloudProvider;
use crate::stack::{StackLifecycleManager, StackState, outputs::keys};
use crate::types::StackKind;

/// Logical resources of the web stack that cannot be deleted until their
/// edge replicas are gone.
pub const EDGE_FUNCTIONS: [&str; 2] = ["ViewerRequestFunction", "OriginResponseFunction"];

/// Result of a destroy run that did not fail.
#[derive(Debug, Clone)]
pub struct DestroySummary {
    pub reports: Vec<StepReport>,
    pub warnings: Vec<Warning>,
}

pub struct DestroyOrchestrator<P: CloudProvider + ?Sized> {
    orchestration: Orchestration<P>,
}

impl<P: CloudProvider + ?Sized> DestroyOrchestrator<P> {
    pub fn new(orchestration: Orchestration<P>) -> Self {
        Self { orchestration }
    }

    pub fn orchestration(&self) -> &Orchestration<P> {
        &self.orchestration
    }

    pub async fn run(&self) -> Result<DestroySummary, OrchestrationError> {
        let orch = &self.orchestration;
        let lifecycle = orch.lifecycle();

        let web = StackSet {
            name: orch.stack_name(StackKind::Web)?,
            template: orch.template(StackKind::Web)?,
        };
        let alias = orch.stack_name(StackKind::Alias)?;
        let domain = orch.stack_name(StackKind::Domain)?;
        let support = orch.stack_name(StackKind::Support)?;

        orch.record(EventKind::Started, Command::Destroy, None);

        let web_outputs = match lifecycle.lookup(&web.name).await {
            Ok(StackState::Exists { outputs, .. }) => outputs,
            Ok(StackState::NotFound) => {
                return Err(OrchestrationError::SiteNotFound {
                    stack: web.name.clone(),
                });
            }
            Err(e) if e.is_cancelled() => return Err(OrchestrationError::Cancelled),
            Err(e) => {
                return Err(self
                    .fail(&lifecycle, Step::DetachAlias, StepError::from(e))
                    .await);
            }
        };

        let mut run = DestroyRun::default();

        // Bucket
        orch.emit(ProgressEvent::StepStarted(Step::EmptyBucket));
        match web_outputs.get(keys::BUCKET_NAME) {
            Some(bucket) => match orch.provider.empty_bucket(bucket).await {
                Ok(()) => run.push(orch, StepReport::success(Step::EmptyBucket, None)),
                Err(e) => {
                    orch.record(EventKind::Error, Command::Destroy, Some(e.to_string()));
                    run.tolerate(
                        orch,
                        Step::EmptyBucket,
                        Warning::bucket_empty(format!("could not empty bucket {}: {}", bucket, e)),
                        e.to_string(),
                    );
                }
            },
            None => run.push(orch, StepReport::skipped(Step::EmptyBucket)),
        }

        // Take the certificate off the distribution so the alias stack can go
        orch.emit(ProgressEvent::StepStarted(Step::DetachAlias));
        let parameters = web_parameters(&orch.site, None, false);
        let result = lifecycle
            .deploy(&web.descriptor(parameters))
            .await
            .map(|_| ())
            .map_err(StepError::from);
        self.settle(&lifecycle, &mut run, Step::DetachAlias, result)
            .await?;

        orch.emit(ProgressEvent::StepStarted(Step::DeleteAlias));
        let result = lifecycle.destroy(&alias, &[]).await.map_err(StepError::from);
        self.settle(&lifecycle, &mut run, Step::DeleteAlias, result)
            .await?;

        // Expected to end in DELETE_FAILED while edge replicas linger
        orch.emit(ProgressEvent::StepStarted(Step::DeleteWeb));
        match lifecycle.destroy(&web.name, &[]).await {
            Ok(()) => run.push(orch, StepReport::success(Step::DeleteWeb, None)),
            Err(e) if e.is_cancelled() => return Err(OrchestrationError::Cancelled),
            Err(e) => {
                orch.record(EventKind::Error, Command::Destroy, Some(e.to_string()));
                run.tolerate(
                    orch,
                    Step::DeleteWeb,
                    Warning::web_delete(format!("first delete of {} failed: {}", web.name, e)),
                    e.to_string(),
                );
            }
        }

        orch.emit(ProgressEvent::StepStarted(Step::DeleteWebRetained));
        let retain: Vec<String> = EDGE_FUNCTIONS.iter().map(|s| s.to_string()).collect();
        let result = lifecycle
            .destroy(&web.name, &retain)
            .await
            .map_err(StepError::from);
        self.settle(&lifecycle, &mut run, Step::DeleteWebRetained, result)
            .await?;

        orch.emit(ProgressEvent::StepStarted(Step::DeleteDomain));
        let result = lifecycle.destroy(&domain, &[]).await.map_err(StepError::from);
        self.settle(&lifecycle, &mut run, Step::DeleteDomain, result)
            .await?;

        orch.emit(ProgressEvent::StepStarted(Step::DeleteSupport));
        let result = lifecycle.destroy(&support, &[]).await.map_err(StepError::from);
        self.settle(&lifecycle, &mut run, Step::DeleteSupport, result)
            .await?;

        info!("site {} destroyed", web.name);
        orch.record(EventKind::Finished, Command::Destroy, None);

        Ok(DestroySummary {
            reports: run.reports,
            warnings: run.diagnostics.into_warnings(),
        })
    }

    async fn settle(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        run: &mut DestroyRun,
        step: Step,
        result: Result<(), StepError>,
    ) -> Result<(), OrchestrationError> {
        match result {
            Ok(()) => {
                run.push(&self.orchestration, StepReport::success(step, None));
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(OrchestrationError::Cancelled),
            Err(e) => {
                let error = self.fail(lifecycle, step, e).await;
                if let OrchestrationError::Step { failure, .. } = &error {
                    run.push(&self.orchestration, StepReport::failure(step, failure.clone()));
                }
                Err(error)
            }
        }
    }

    async fn fail(
        &self,
        lifecycle: &StackLifecycleManager<P>,
        step: Step,
        error: StepError,
    ) -> OrchestrationError {
        let orch = &self.orchestration;
        orch.record(EventKind::Error, Command::Destroy, Some(error.to_string()));
        if error.is_configuration() {
            return OrchestrationError::config(error.to_string());
        }
        let failure = orch.describe_failure(lifecycle, step, &error).await;
        OrchestrationError::Step { step, failure }
    }
}

#[derive(Default)]
struct DestroyRun {
    reports: Vec<StepReport>,
    diagnostics: Diagnostics,
}

impl DestroyRun {
    fn push<P: CloudProvider + ?Sized>(&mut self, orch: &Orchestration<P>, report: StepReport) {
        orch.emit(ProgressEvent::StepFinished(report.clone()));
        self.reports.push(report);
    }

    /// Record a non-fatal failure and carry on.
    fn tolerate<P: CloudProvider + ?Sized>(
        &mut self,
        orch: &Orchestration<P>,
        step: Step,
        warning: Warning,
        cause: String,
    ) {
        let failure = super::step::StepFailure {
            message: step.failure_message().to_string(),
            reason: None,
            cause,
        };
        self.diagnostics.warn(warning);
        self.push(orch, StepReport::failure(step, failure));
    }
}
