// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates hoist.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, domain: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let config = Config {
        domain: domain.map(String::from),
        ..Config::default()
    };
    config.validate()?;

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let domain = match &config.domain {
        Some(domain) => format!("domain: {}", domain),
        None => "# domain: example.com".to_string(),
    };

    format!(
        r#"dir: {}
{}
# redirect_www: true
index_document: {}
error_document: {}
# spa: true
region: {}
# profile: default
# Stack templates are read from {{templates}}/{{web,domain,alias}}.yaml
templates: {}
"#,
        config.dir.display(),
        domain,
        config.index_document,
        config.error_document,
        config.region,
        config.templates.display(),
    )
}
