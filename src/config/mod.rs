// ABOUTME: Configuration types and parsing for hoist.yml.
// ABOUTME: Handles YAML parsing, defaults, validation, and destination merging.

mod init;
mod polling;

pub use init::init_config;
pub use polling::{DnsValidationConfig, PollingConfig};

use crate::deploy::SiteSettings;
use crate::error::{Error, Result};
use crate::types::validate_prefix;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "hoist.yml";
pub const CONFIG_FILENAME_ALT: &str = "hoist.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hoist/config.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory published to the site bucket.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub redirect_www: bool,

    #[serde(default = "default_index_document")]
    pub index_document: String,

    #[serde(default = "default_error_document")]
    pub error_document: String,

    #[serde(default)]
    pub spa: bool,

    #[serde(default)]
    pub csp: Option<String>,

    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Directory holding `{kind}.yaml` stack templates.
    #[serde(default = "default_templates")]
    pub templates: PathBuf,

    #[serde(default = "default_stack_prefix")]
    pub stack_prefix: String,

    #[serde(default)]
    pub verification_marker: Option<String>,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub dns_validation: DnsValidationConfig,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Destination {
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub redirect_www: Option<bool>,

    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

fn default_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_index_document() -> String {
    "index.html".to_string()
}

fn default_error_document() -> String {
    "404.html".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_templates() -> PathBuf {
    PathBuf::from(".hoist/stacks")
}

fn default_stack_prefix() -> String {
    "hoist".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dir: default_dir(),
            domain: None,
            redirect_www: false,
            index_document: default_index_document(),
            error_document: default_error_document(),
            spa: false,
            csp: None,
            profile: None,
            region: default_region(),
            templates: default_templates(),
            stack_prefix: default_stack_prefix(),
            verification_marker: None,
            polling: PollingConfig::default(),
            dns_validation: DnsValidationConfig::default(),
            destinations: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => Err(Error::ConfigNotFound(dir.to_path_buf())),
        }
    }

    /// Like [`discover`](Self::discover), but a project without a config file
    /// gets the defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("no config file in {}, using defaults", dir.display());
                Ok(Config::default())
            }
        }
    }

    fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref dir) = dest.dir {
            merged.dir = dir.clone();
        }
        if dest.domain.is_some() {
            merged.domain = dest.domain.clone();
        }
        if let Some(redirect_www) = dest.redirect_www {
            merged.redirect_www = redirect_www;
        }
        if dest.profile.is_some() {
            merged.profile = dest.profile.clone();
        }
        if let Some(ref region) = dest.region {
            merged.region = region.clone();
        }

        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.stack_prefix).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        if let Some(domain) = &self.domain {
            validate_domain(domain)?;
        }
        if self.index_document.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "index_document cannot be empty".to_string(),
            ));
        }
        if self.error_document.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "error_document cannot be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(Error::InvalidConfig("region cannot be empty".to_string()));
        }
        if self.dns_validation.max_attempts == Some(0) {
            return Err(Error::InvalidConfig(
                "dns_validation.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Site settings with the publish directory resolved against `project_dir`.
    pub fn site_settings(&self, project_dir: &Path) -> SiteSettings {
        SiteSettings {
            dir: project_dir.join(&self.dir),
            domain: self.domain.clone(),
            redirect_www: self.redirect_www,
            index_document: self.index_document.clone(),
            error_document: self.error_document.clone(),
            spa: self.spa,
            csp: self.csp.clone(),
        }
    }

    pub fn templates_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.templates)
    }
}

fn validate_domain(domain: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidConfig(format!("invalid domain {:?}: {}", domain, reason));

    if domain.is_empty() {
        return Err(invalid("empty"));
    }
    if domain.contains("://") || domain.contains('/') {
        return Err(invalid("use a bare host name without scheme or path"));
    }
    if !domain.contains('.') {
        return Err(invalid("missing top-level domain"));
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(invalid("empty label"));
    }
    if let Some(c) = domain
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '.')
    {
        return Err(invalid(&format!("unexpected character '{}'", c)));
    }
    Ok(())
}
