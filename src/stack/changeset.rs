// ABOUTME: Change set creation, readiness polling, execution, and discard.
// ABOUTME: Every attempt uses a fresh change set name so retries never collide.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::StackError;
use super::poll::{MAX_CONSECUTIVE_ERRORS, PollSchedule};
use super::template::{ParameterValue, Template};
use crate::cancel::Cancellation;
use crate::provider::{ChangeSetDescription, ChangeSetRequest, ChangeSetType, StackOps};
use crate::types::{ChangeSetId, StackName};

/// Reasons the provider gives for a change set that has nothing to apply.
const NO_CHANGE_REASONS: [&str; 2] = [
    "The submitted information didn't contain changes.",
    "No updates are to be performed.",
];

/// Prefix of every change set name this tool creates.
const CHANGE_SET_PREFIX: &str = "hoist";

/// An open change set. Must end up executed or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetHandle {
    pub stack: StackName,
    pub id: ChangeSetId,
    pub name: String,
    pub change_set_type: ChangeSetType,
}

pub struct ChangeSetManager<P: StackOps + ?Sized> {
    provider: Arc<P>,
    schedule: PollSchedule,
    cancel: Cancellation,
}

impl<P: StackOps + ?Sized> ChangeSetManager<P> {
    pub fn new(provider: Arc<P>, schedule: PollSchedule, cancel: Cancellation) -> Self {
        Self {
            provider,
            schedule,
            cancel,
        }
    }

    /// Open a change set against `stack`.
    pub async fn create(
        &self,
        stack: &StackName,
        change_set_type: ChangeSetType,
        template: &Template,
        parameters: Vec<ParameterValue>,
    ) -> Result<ChangeSetHandle, StackError> {
        self.cancel.check()?;

        let execution = uuid::Uuid::new_v4();
        let name = format!("{}-{}", CHANGE_SET_PREFIX, execution);
        let request = ChangeSetRequest {
            stack_name: stack.clone(),
            change_set_name: name.clone(),
            change_set_type,
            description: format!("{} change set for execution {}", CHANGE_SET_PREFIX, execution),
            template_body: template.body().to_string(),
            parameters,
        };

        info!("creating {} change set {} for {}", change_set_type, name, stack);
        let id = self.provider.create_change_set(&request).await?;

        Ok(ChangeSetHandle {
            stack: stack.clone(),
            id,
            name,
            change_set_type,
        })
    }

    /// Poll until the change set has been computed.
    ///
    /// Returns the description when it is ready to execute or when it has no
    /// changes. Any other terminal status is an error.
    pub async fn wait_for_ready(
        &self,
        handle: &ChangeSetHandle,
    ) -> Result<ChangeSetDescription, StackError> {
        let deadline = self.schedule.start();
        let mut consecutive_errors = 0;

        loop {
            match self
                .provider
                .describe_change_set(&handle.stack, &handle.id)
                .await
            {
                Ok(description) => {
                    consecutive_errors = 0;
                    match description.status.as_str() {
                        "CREATE_PENDING" | "CREATE_IN_PROGRESS" => {
                            debug!("change set {} is {}", handle.name, description.status);
                        }
                        "CREATE_COMPLETE" => return Ok(description),
                        _ if Self::has_no_changes(&description) => {
                            debug!("change set {} has no changes", handle.name);
                            return Ok(description);
                        }
                        _ => {
                            return Err(StackError::ChangeSetFailed {
                                stack: handle.stack.clone(),
                                status: description.status,
                                reason: description.status_reason,
                            });
                        }
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(e.into());
                    }
                    warn!("failed to describe change set {}: {}", handle.name, e);
                }
            }

            if deadline.expired() {
                return Err(StackError::Timeout {
                    stack: handle.stack.clone(),
                    elapsed: deadline.elapsed(),
                });
            }
            self.cancel.sleep(self.schedule.interval).await?;
        }
    }

    /// Whether a computed change set reports nothing to update.
    pub fn has_no_changes(description: &ChangeSetDescription) -> bool {
        description.status == "FAILED"
            && description
                .status_reason
                .as_deref()
                .is_some_and(|reason| NO_CHANGE_REASONS.iter().any(|p| reason.starts_with(p)))
    }

    pub async fn execute(&self, handle: &ChangeSetHandle) -> Result<(), StackError> {
        info!("executing change set {} on {}", handle.name, handle.stack);
        self.provider
            .execute_change_set(&handle.stack, &handle.id)
            .await?;
        Ok(())
    }

    pub async fn discard(&self, handle: &ChangeSetHandle) -> Result<(), StackError> {
        debug!("discarding change set {} on {}", handle.name, handle.stack);
        self.provider
            .delete_change_set(&handle.stack, &handle.id)
            .await?;
        Ok(())
    }
}
