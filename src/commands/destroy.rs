// ABOUTME: Destroy command implementation.
// ABOUTME: Tears down every stack of the current project and branch.

use super::project::Project;
use super::spawn_printer;
use crate::cli::SiteArgs;
use hoist::cancel::Cancellation;
use hoist::deploy::DestroyOrchestrator;
use hoist::error::Result;
use hoist::output::Output;
use tokio::sync::mpsc;

pub async fn destroy(args: SiteArgs, mut output: Output, cancel: Cancellation) -> Result<()> {
    let project = Project::load(&args)?;

    output.start_timer();
    output.progress(&format!(
        "Destroying {} ({})",
        project.naming.identity().project(),
        project.naming.identity().branch(),
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx, output.mode());

    let orchestrator = DestroyOrchestrator::new(project.orchestration(cancel, tx));
    let result = orchestrator.run().await;
    drop(orchestrator);
    let _ = printer.await;

    let summary = result?;
    for warning in &summary.warnings {
        output.warning(&warning.message);
    }

    output.success("✓ Site destroyed");
    Ok(())
}
