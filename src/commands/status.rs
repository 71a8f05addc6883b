// ABOUTME: Status command implementation.
// ABOUTME: Prints the lifecycle status and outputs of each stack of the project.

use super::project::Project;
use crate::cli::SiteArgs;
use hoist::cancel::Cancellation;
use hoist::error::Result;
use hoist::stack::{StackLifecycleManager, StackState};
use hoist::types::StackKind;
use std::sync::Arc;

pub async fn status(args: SiteArgs, cancel: Cancellation) -> Result<()> {
    let project = Project::load(&args)?;
    let polling = project.config.polling.settings();
    let lifecycle = StackLifecycleManager::new(
        Arc::new(project.aws.clone()),
        polling.stack,
        polling.change_set,
        cancel,
    );

    println!(
        "Project: {} ({})",
        project.naming.identity().project(),
        project.naming.identity().branch()
    );

    for kind in StackKind::ALL {
        let name = project.naming.stack_name(kind)?;
        match lifecycle.lookup(&name).await? {
            StackState::NotFound => println!("  {kind}: {name} (not deployed)"),
            StackState::Exists { status, outputs } => {
                println!("  {kind}: {name} {status}");
                for (key, value) in outputs.iter() {
                    println!("      {key}: {value}");
                }
            }
        }
    }

    Ok(())
}
