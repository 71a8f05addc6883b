// ABOUTME: Multi-stack deploy and destroy choreography.
// ABOUTME: Exports the orchestrators, step reporting types, and run settings.

mod context;
mod destroy;
mod dns;
mod error;
mod orchestrator;
mod params;
mod step;

pub use context::{Orchestration, PollingSettings, RunContext};
pub use destroy::{DestroyOrchestrator, DestroySummary, EDGE_FUNCTIONS};
pub use dns::{DEFAULT_MARKER, DnsValidation, contains_marker};
pub use error::{OrchestrationError, OrchestrationErrorKind};
pub use orchestrator::{DeployOrchestrator, DeploySummary};
pub use params::{SiteSettings, alias_parameters, domain_parameters, web_parameters};
pub use step::{Phase, ProgressEvent, Step, StepFailure, StepOutcome, StepReport};
