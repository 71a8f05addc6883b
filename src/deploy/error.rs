// ABOUTME: Orchestration error types with SNAFU pattern.
// ABOUTME: Distinguishes configuration, step failure, missing site, and cancellation for programmatic handling.

use snafu::Snafu;

use super::step::{Step, StepFailure};
use crate::cancel::Cancelled;
use crate::provider::ProviderError;
use crate::stack::StackError;
use crate::types::StackName;

/// Final error of a deploy or destroy run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OrchestrationError {
    #[snafu(display("invalid configuration: {message}"))]
    Config { message: String },

    #[snafu(display("{failure}"))]
    Step { step: Step, failure: StepFailure },

    #[snafu(display("Couldn't find site {stack}. Are you sure you've deployed (from this branch)?"))]
    SiteNotFound { stack: StackName },

    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationErrorKind {
    /// Invalid settings or templates; nothing remote was changed.
    Config,
    /// A choreography step failed.
    StepFailed,
    /// Destroy found no deployed site.
    SiteNotFound,
    /// The caller cancelled the run.
    Cancelled,
}

impl OrchestrationError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> OrchestrationErrorKind {
        match self {
            OrchestrationError::Config { .. } => OrchestrationErrorKind::Config,
            OrchestrationError::Step { .. } => OrchestrationErrorKind::StepFailed,
            OrchestrationError::SiteNotFound { .. } => OrchestrationErrorKind::SiteNotFound,
            OrchestrationError::Cancelled => OrchestrationErrorKind::Cancelled,
        }
    }

    /// The failed step, if this is a step failure.
    pub fn step(&self) -> Option<Step> {
        match self {
            OrchestrationError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The provider's failure reason, if one was found.
    pub fn reason(&self) -> Option<&str> {
        match self {
            OrchestrationError::Step { failure, .. } => failure.reason.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        OrchestrationError::Config {
            message: message.into(),
        }
    }
}

impl From<Cancelled> for OrchestrationError {
    fn from(_: Cancelled) -> Self {
        OrchestrationError::Cancelled
    }
}

/// Errors raised inside a single step, before they are turned into a report.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StepError {
    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl StepError {
    pub(crate) fn is_cancelled(&self) -> bool {
        match self {
            StepError::Cancelled(_) => true,
            StepError::Stack(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// Missing template parameters are a configuration problem, not a remote
    /// failure.
    pub(crate) fn is_configuration(&self) -> bool {
        matches!(self, StepError::Stack(StackError::MissingParameters { .. }))
    }
}
