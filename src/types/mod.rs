// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Stack naming, project identity, and phantom-typed provider IDs.

mod id;
mod project;
mod stack_name;

pub use id::{ChangeSetId, DistributionId, HostedZoneId, Id};
pub use project::current_branch;
pub use stack_name::{
    DEFAULT_BRANCH, ProjectIdentity, StackKind, StackName, StackNameError, StackNaming,
    canonicalize, validate_prefix,
};
