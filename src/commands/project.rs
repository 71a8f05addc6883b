// ABOUTME: Shared setup for commands that talk to the cloud.
// ABOUTME: Resolves config, project identity, stack naming, and the AWS provider.

use crate::cli::SiteArgs;
use hoist::cancel::Cancellation;
use hoist::config::Config;
use hoist::deploy::{Orchestration, ProgressEvent};
use hoist::error::Result;
use hoist::events::TracingReporter;
use hoist::provider::aws::AwsCli;
use hoist::stack::FileTemplateSource;
use hoist::types::{ProjectIdentity, StackNaming};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A project resolved from the working directory and command-line overrides.
pub struct Project {
    pub dir: PathBuf,
    pub config: Config,
    pub naming: StackNaming,
    pub aws: AwsCli,
}

impl Project {
    pub fn load(args: &SiteArgs) -> Result<Self> {
        let dir = env::current_dir()?;
        let config = Config::discover_or_default(&dir)?;

        // Apply destination overrides if specified
        let mut config = match &args.destination {
            Some(dest) => config.for_destination(dest)?,
            None => config,
        };

        if let Some(site_dir) = &args.dir {
            config.dir = site_dir.clone();
        }
        if args.domain.is_some() {
            config.domain = args.domain.clone();
        }
        if args.profile.is_some() {
            config.profile = args.profile.clone();
        }
        config.validate()?;

        let identity = ProjectIdentity::discover(&dir)?;
        let naming = StackNaming::new(&config.stack_prefix, identity)?;
        let aws = AwsCli::new(config.profile.clone(), config.region.clone());

        tracing::debug!(
            project = naming.identity().project(),
            branch = naming.identity().branch(),
            region = aws.region(),
            "resolved project"
        );

        Ok(Self {
            dir,
            config,
            naming,
            aws,
        })
    }

    pub fn orchestration(
        &self,
        cancel: Cancellation,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> Orchestration<AwsCli> {
        let templates = FileTemplateSource::new(self.config.templates_dir(&self.dir));
        Orchestration::new(
            Arc::new(self.aws.clone()),
            Arc::new(templates),
            self.naming.clone(),
            self.config.site_settings(&self.dir),
        )
        .with_reporter(Arc::new(TracingReporter))
        .with_polling(self.config.polling.settings())
        .with_cancellation(cancel)
        .with_progress(progress)
    }
}
