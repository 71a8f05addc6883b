// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Deploy static sites to AWS with CloudFormation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new hoist.yml configuration file
    Init {
        /// Custom domain to serve the site from
        #[arg(long)]
        domain: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy the site
    Deploy {
        #[command(flatten)]
        site: SiteArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Tear down every stack of the site
    Destroy {
        #[command(flatten)]
        site: SiteArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the status and outputs of each stack
    Status {
        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Overrides for values in hoist.yml.
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    /// Directory to publish
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Custom domain to serve the site from
    #[arg(long)]
    pub domain: Option<String>,

    /// AWS profile to use
    #[arg(long)]
    pub profile: Option<String>,

    /// Target destination (defined in config)
    #[arg(short, long)]
    pub destination: Option<String>,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Minimal output for CI
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Output JSON lines
    #[arg(long)]
    pub json: bool,
}
