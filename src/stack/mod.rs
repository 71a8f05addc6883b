// ABOUTME: Infrastructure stack lifecycle: status, templates, change sets, and deploy/destroy.
// ABOUTME: Everything here operates on one named stack at a time.

mod changeset;
mod error;
mod lifecycle;
pub mod outputs;
mod poll;
mod status;
mod template;

pub use changeset::{ChangeSetHandle, ChangeSetManager};
pub use error::StackError;
pub use lifecycle::{StackLifecycleManager, StackState};
pub use outputs::DeploymentOutputs;
pub use poll::{Deadline, MAX_CONSECUTIVE_ERRORS, PollSchedule};
pub use status::{DELETE_COMPLETE, NOT_FOUND, REVIEW_IN_PROGRESS, StackStatus};
pub use template::{
    FileTemplateSource, ParameterDecl, ParameterValue, StackDescriptor, StackParameters,
    Template, TemplateError, TemplateSource,
};
