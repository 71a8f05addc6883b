// ABOUTME: Deploy command implementation.
// ABOUTME: Wires the AWS provider, publisher, and DNS check into the deploy orchestrator.

use super::project::Project;
use super::spawn_printer;
use crate::cli::SiteArgs;
use hoist::cancel::Cancellation;
use hoist::deploy::DeployOrchestrator;
use hoist::error::Result;
use hoist::output::Output;
use hoist::provider::DigResolver;
use hoist::publish::AwsCliPublisher;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Deploy the site for the current project and branch.
pub async fn deploy(args: SiteArgs, mut output: Output, cancel: Cancellation) -> Result<()> {
    let project = Project::load(&args)?;

    output.start_timer();
    output.progress(&format!(
        "Deploying {} ({}) to {}",
        project.naming.identity().project(),
        project.naming.identity().branch(),
        project.config.domain.as_deref().unwrap_or("CloudFront"),
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx, output.mode());

    let dns = project
        .config
        .dns_validation
        .settings(project.config.verification_marker.as_deref());
    let orchestrator = DeployOrchestrator::new(project.orchestration(cancel, tx))
        .with_publisher(Arc::new(AwsCliPublisher::new(project.aws.clone())))
        .with_resolver(Arc::new(DigResolver::new()))
        .with_dns_validation(dns);

    let result = orchestrator.run().await;
    // Closing the progress channel lets the printer drain and stop
    drop(orchestrator);
    let _ = printer.await;

    let summary = result?;

    for warning in &summary.warnings {
        output.warning(&warning.message);
    }

    let url = summary.site_url.as_deref().unwrap_or("(no URL reported)");
    if summary.finished {
        output.success(&format!("✓ Site deployed: {url}"));
    } else {
        output.success(&format!("Site deployed with pending steps: {url}"));
    }

    Ok(())
}
