// ABOUTME: Drives a single stack through lookup, deploy, and destroy to a terminal state.
// ABOUTME: Recovers from failed creations by deleting first; deploy is idempotent via no-change detection.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::changeset::{ChangeSetHandle, ChangeSetManager};
use super::error::StackError;
use super::outputs::DeploymentOutputs;
use super::poll::{MAX_CONSECUTIVE_ERRORS, PollSchedule};
use super::status::StackStatus;
use super::template::StackDescriptor;
use crate::cancel::Cancellation;
use crate::provider::{ChangeSetType, StackOps};
use crate::types::StackName;

/// Reason attached to resources whose creation was cancelled because a
/// sibling failed. Never the interesting failure.
const CANCELLED_REASON: &str = "Resource creation cancelled";

/// The remote state of one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackState {
    NotFound,
    Exists {
        status: StackStatus,
        /// Empty unless the status is a completed one.
        outputs: DeploymentOutputs,
    },
}

impl StackState {
    pub fn exists(&self) -> bool {
        matches!(self, StackState::Exists { .. })
    }

    /// The observed status; a synthetic `NOT_FOUND` for missing stacks.
    pub fn status(&self) -> StackStatus {
        match self {
            StackState::NotFound => StackStatus::not_found(),
            StackState::Exists { status, .. } => status.clone(),
        }
    }

    pub fn outputs(&self) -> DeploymentOutputs {
        match self {
            StackState::NotFound => DeploymentOutputs::new(),
            StackState::Exists { outputs, .. } => outputs.clone(),
        }
    }
}

pub struct StackLifecycleManager<P: StackOps + ?Sized> {
    provider: Arc<P>,
    change_sets: ChangeSetManager<P>,
    schedule: PollSchedule,
    cancel: Cancellation,
}

impl<P: StackOps + ?Sized> StackLifecycleManager<P> {
    pub fn new(
        provider: Arc<P>,
        stack_schedule: PollSchedule,
        change_set_schedule: PollSchedule,
        cancel: Cancellation,
    ) -> Self {
        Self {
            change_sets: ChangeSetManager::new(
                Arc::clone(&provider),
                change_set_schedule,
                cancel.clone(),
            ),
            provider,
            schedule: stack_schedule,
            cancel,
        }
    }

    pub fn change_sets(&self) -> &ChangeSetManager<P> {
        &self.change_sets
    }

    /// Current state of a stack. A missing or fully deleted stack is
    /// `NotFound`, never an error.
    pub async fn lookup(&self, name: &StackName) -> Result<StackState, StackError> {
        match self.provider.describe_stack(name).await {
            Ok(description) if description.status.is_fully_deleted() => Ok(StackState::NotFound),
            Ok(description) => {
                let outputs = if description.status.is_complete() {
                    description.outputs
                } else {
                    DeploymentOutputs::new()
                };
                Ok(StackState::Exists {
                    status: description.status,
                    outputs,
                })
            }
            Err(e) if e.is_not_found() => Ok(StackState::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or update a stack and return its outputs.
    pub async fn deploy(
        &self,
        descriptor: &StackDescriptor,
    ) -> Result<DeploymentOutputs, StackError> {
        let name = &descriptor.stack_name;
        self.cancel.check()?;

        let mut state = self.lookup(name).await?;

        if state.status().is_creation_failure() {
            info!("stack {} is in {}, deleting before deploy", name, state.status().name());
            self.provider.delete_stack(name, &[]).await?;
            match self.wait_until_settled(name).await? {
                StackState::Exists { status, .. } if !status.is_fully_deleted() => {
                    return Err(StackError::CreationFailureNotCleared {
                        stack: name.clone(),
                        status,
                    });
                }
                _ => state = StackState::NotFound,
            }
        }

        let parameters = descriptor.template.resolve(name, &descriptor.parameters)?;

        let change_set_type = match &state {
            StackState::Exists { status, .. } if !status.is_review_in_progress() => {
                ChangeSetType::Update
            }
            _ => ChangeSetType::Create,
        };

        let handle = self
            .change_sets
            .create(name, change_set_type, &descriptor.template, parameters)
            .await?;

        let description = match self.change_sets.wait_for_ready(&handle).await {
            Ok(description) => description,
            Err(e) => {
                self.discard_quietly(&handle).await;
                return Err(e);
            }
        };

        if ChangeSetManager::<P>::has_no_changes(&description) {
            info!("stack {} is up to date", name);
            self.change_sets.discard(&handle).await?;
            return Ok(state.outputs());
        }

        self.change_sets.execute(&handle).await?;

        match self.wait_until_settled(name).await? {
            StackState::NotFound => Err(StackError::Disappeared(name.clone())),
            StackState::Exists { status, outputs } => {
                if status.is_creation_failure() || !status.is_deploy_success() {
                    return Err(StackError::DeployFailed {
                        stack: name.clone(),
                        status,
                    });
                }
                info!("stack {} deployed: {}", name, status.name());
                Ok(outputs)
            }
        }
    }

    /// Delete a stack, keeping the named logical resources. A stack that does
    /// not exist is left alone.
    pub async fn destroy(&self, name: &StackName, retain: &[String]) -> Result<(), StackError> {
        self.cancel.check()?;

        if !self.lookup(name).await?.exists() {
            debug!("stack {} does not exist, nothing to delete", name);
            return Ok(());
        }

        info!("deleting stack {}", name);
        self.provider.delete_stack(name, retain).await?;

        match self.wait_until_settled(name).await? {
            StackState::NotFound => Ok(()),
            StackState::Exists { status, .. } if status.is_fully_deleted() => Ok(()),
            StackState::Exists { status, .. } => Err(StackError::DeleteFailed {
                stack: name.clone(),
                status,
            }),
        }
    }

    /// The most recent creation or update failure reason recorded in the
    /// stack's events, skipping cancellations caused by other failures.
    pub async fn latest_failure_reason(
        &self,
        name: &StackName,
    ) -> Result<Option<String>, StackError> {
        let events = match self.provider.stack_events(name).await {
            Ok(events) => events,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(events.into_iter().find_map(|event| {
            let failed =
                event.resource_status == "CREATE_FAILED" || event.resource_status == "UPDATE_FAILED";
            match event.reason {
                Some(reason) if failed && !reason.starts_with(CANCELLED_REASON) => Some(reason),
                _ => None,
            }
        }))
    }

    /// Poll until the stack is no longer mid-operation.
    async fn wait_until_settled(&self, name: &StackName) -> Result<StackState, StackError> {
        let deadline = self.schedule.start();
        let mut consecutive_errors = 0;

        loop {
            match self.lookup(name).await {
                Ok(state) => {
                    consecutive_errors = 0;
                    match &state {
                        StackState::Exists { status, .. } if status.is_in_progress() => {
                            debug!("stack {} is {}", name, status.name());
                        }
                        _ => return Ok(state),
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(e);
                    }
                    warn!("failed to describe stack {}: {}", name, e);
                }
            }

            if deadline.expired() {
                return Err(StackError::Timeout {
                    stack: name.clone(),
                    elapsed: deadline.elapsed(),
                });
            }
            self.cancel.sleep(self.schedule.interval).await?;
        }
    }

    async fn discard_quietly(&self, handle: &ChangeSetHandle) {
        if let Err(e) = self.change_sets.discard(handle).await {
            warn!("failed to discard change set {}: {}", handle.name, e);
        }
    }
}
