// ABOUTME: Entry point for the hoist CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, OutputArgs};
use hoist::cancel::Cancellation;
use hoist::config;
use hoist::error::Result;
use hoist::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("hoist=debug"),
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cancel = Cancellation::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current request");
            on_interrupt.cancel();
        }
    });

    let result = run(cli, cancel).await;

    if let Err(e) = result {
        if e.is_cancelled() {
            eprintln!("Cancelled");
            std::process::exit(130);
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn output_for(args: OutputArgs) -> Output {
    let mode = if args.json {
        OutputMode::Json
    } else if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    Output::new(mode)
}

async fn run(cli: Cli, cancel: Cancellation) -> Result<()> {
    match cli.command {
        Commands::Init { domain, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, domain.as_deref(), force)?;
            println!("Created {}", config::CONFIG_FILENAME);
            Ok(())
        }
        Commands::Deploy { site, output } => {
            commands::deploy(site, output_for(output), cancel).await
        }
        Commands::Destroy { site, output } => {
            commands::destroy(site, output_for(output), cancel).await
        }
        Commands::Status { site } => commands::status(site, cancel).await,
    }
}
