// ABOUTME: Remote stack status with derived lifecycle predicates.
// ABOUTME: Statuses are only ever re-fetched from the provider, never mutated locally.

use std::fmt;

/// Status name used locally to represent a stack the provider does not know.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Terminal status of a fully deleted stack.
pub const DELETE_COMPLETE: &str = "DELETE_COMPLETE";

/// Status of a stack created by a change set that was never executed.
pub const REVIEW_IN_PROGRESS: &str = "REVIEW_IN_PROGRESS";

/// A stack status as last reported by the provider, plus its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackStatus {
    name: String,
    reason: Option<String>,
}

impl StackStatus {
    pub fn new(name: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.filter(|r| !r.is_empty()),
        }
    }

    pub fn not_found() -> Self {
        Self::new(NOT_FOUND, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// The stack failed its first creation and must be deleted before it can
    /// be deployed again.
    pub fn is_creation_failure(&self) -> bool {
        self.name == "ROLLBACK_COMPLETE" || self.name == "ROLLBACK_FAILED"
    }

    pub fn is_deleted(&self) -> bool {
        self.name.starts_with("DELETE_")
    }

    pub fn is_failure(&self) -> bool {
        self.name.ends_with("FAILED")
    }

    /// An operation is running. Review counts: a freshly executed create
    /// change set can still report it before the stack starts creating.
    pub fn is_in_progress(&self) -> bool {
        self.name.ends_with("_IN_PROGRESS")
    }

    /// Created by a change set that has not been executed yet.
    pub fn is_review_in_progress(&self) -> bool {
        self.name == REVIEW_IN_PROGRESS
    }

    pub fn is_not_found(&self) -> bool {
        self.name == NOT_FOUND
    }

    pub fn is_deploy_success(&self) -> bool {
        !self.is_not_found() && (self.name == "CREATE_COMPLETE" || self.name == "UPDATE_COMPLETE")
    }

    /// Any settled `*_COMPLETE` status, including rollbacks.
    pub fn is_complete(&self) -> bool {
        self.name.ends_with("_COMPLETE")
    }

    pub fn is_fully_deleted(&self) -> bool {
        self.name == DELETE_COMPLETE
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.name, reason),
            None => f.write_str(&self.name),
        }
    }
}
