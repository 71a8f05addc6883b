// ABOUTME: Command module aggregator for the hoist CLI.
// ABOUTME: Re-exports deploy, destroy, and status command handlers.

mod deploy;
mod destroy;
mod project;
mod status;

pub use deploy::deploy;
pub use destroy::destroy;
pub use status::status;

use hoist::deploy::ProgressEvent;
use hoist::output::{Output, OutputMode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Render progress events until the sending side is dropped.
fn spawn_printer(
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    mode: OutputMode,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let output = Output::new(mode);
        while let Some(event) = rx.recv().await {
            output.event(&event);
        }
    })
}
