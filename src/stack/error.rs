// ABOUTME: Errors from stack lifecycle and change set operations.
// ABOUTME: Carries the stack name and last observed status where one exists.

use std::time::Duration;
use thiserror::Error;

use super::status::StackStatus;
use crate::cancel::Cancelled;
use crate::provider::ProviderError;
use crate::types::StackName;

#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("missing required parameters for {stack}: {}", names.join(", "))]
    MissingParameters { stack: StackName, names: Vec<String> },

    #[error("change set for {stack} failed with status {status}: {}", reason.as_deref().unwrap_or("no reason given"))]
    ChangeSetFailed {
        stack: StackName,
        status: String,
        reason: Option<String>,
    },

    #[error("stack {stack} failed to create and could not be removed: {status}")]
    CreationFailureNotCleared { stack: StackName, status: StackStatus },

    #[error("stack {0} disappeared while deploying")]
    Disappeared(StackName),

    #[error("stack {stack} failed to deploy: {status}")]
    DeployFailed { stack: StackName, status: StackStatus },

    #[error("stack {stack} failed to delete: {status}")]
    DeleteFailed { stack: StackName, status: StackStatus },

    #[error("timed out after {elapsed:?} waiting for {stack}")]
    Timeout { stack: StackName, elapsed: Duration },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl StackError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StackError::Cancelled(_))
    }

    /// The status reason the provider reported, if this error carries one.
    pub fn status_reason(&self) -> Option<&str> {
        match self {
            StackError::CreationFailureNotCleared { status, .. }
            | StackError::DeployFailed { status, .. }
            | StackError::DeleteFailed { status, .. } => status.reason(),
            StackError::ChangeSetFailed { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}
