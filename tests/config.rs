// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, destination merging, and discovery.

use hoist::config::*;
use hoist::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dir, PathBuf::from("public"));
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.error_document, "404.html");
        assert_eq!(config.stack_prefix, "hoist");
        assert!(config.domain.is_none());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
dir: dist
domain: example.com
redirect_www: true
index_document: home.html
error_document: oops.html
spa: true
csp: "default-src 'self'"
profile: sites
region: eu-west-1
templates: infra/stacks
stack_prefix: acme
verification_marker: acme-site-verification

polling:
  stack_interval: 10s
  stack_timeout: 90m

dns_validation:
  interval: 2s
  max_attempts: 300

destinations:
  staging:
    domain: staging.example.com
    profile: staging
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.dir, PathBuf::from("dist"));
        assert_eq!(config.domain.as_deref(), Some("example.com"));
        assert!(config.redirect_www);
        assert!(config.spa);
        assert_eq!(config.csp.as_deref(), Some("default-src 'self'"));
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.stack_prefix, "acme");
        assert_eq!(config.polling.stack_interval, Duration::from_secs(10));
        assert_eq!(config.polling.stack_timeout, Duration::from_secs(90 * 60));
        assert_eq!(config.dns_validation.max_attempts, Some(300));
        assert_eq!(config.destinations.len(), 1);

        let dns = config
            .dns_validation
            .settings(config.verification_marker.as_deref());
        assert_eq!(dns.interval, Duration::from_secs(2));
        assert_eq!(dns.marker, "acme-site-verification");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Config::from_yaml("domian: example.com\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}

mod validation {
    use super::*;

    fn invalid(yaml: &str) -> String {
        match Config::from_yaml(yaml) {
            Err(Error::InvalidConfig(message)) => message,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn rejects_domain_with_scheme() {
        assert!(invalid("domain: https://example.com\n").contains("scheme"));
    }

    #[test]
    fn rejects_domain_without_tld() {
        assert!(invalid("domain: localhost\n").contains("top-level"));
    }

    #[test]
    fn rejects_bad_prefix() {
        invalid("stack_prefix: 9lives\n");
        invalid("stack_prefix: my_org\n");
    }

    #[test]
    fn rejects_empty_documents() {
        assert!(invalid("index_document: \"\"\n").contains("index_document"));
        assert!(invalid("error_document: \" \"\n").contains("error_document"));
    }

    #[test]
    fn rejects_zero_dns_attempts() {
        assert!(invalid("dns_validation:\n  max_attempts: 0\n").contains("max_attempts"));
    }
}

mod destinations {
    use super::*;

    const YAML: &str = r#"
domain: example.com
region: us-east-1
destinations:
  preview:
    dir: build
    domain: preview.example.com
    redirect_www: true
    region: eu-central-1
  broken:
    domain: "not a domain"
"#;

    #[test]
    fn destination_overrides_base() {
        let config = Config::from_yaml(YAML).unwrap();
        let merged = config.for_destination("preview").unwrap();

        assert_eq!(merged.dir, PathBuf::from("build"));
        assert_eq!(merged.domain.as_deref(), Some("preview.example.com"));
        assert!(merged.redirect_www);
        assert_eq!(merged.region, "eu-central-1");
        assert_eq!(merged.index_document, config.index_document);
    }

    #[test]
    fn unknown_destination() {
        let config = Config::from_yaml(YAML).unwrap();
        assert!(matches!(
            config.for_destination("production"),
            Err(Error::UnknownDestination(name)) if name == "production"
        ));
    }

    #[test]
    fn merged_destination_is_validated() {
        let config = Config::from_yaml(YAML).unwrap();
        assert!(matches!(
            config.for_destination("broken"),
            Err(Error::InvalidConfig(_))
        ));
    }
}

mod discovery {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hoist.yml", "domain: example.com\n");

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn finds_config_in_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".hoist/config.yml", "spa: true\n");

        assert!(Config::discover(dir.path()).unwrap().spa);
    }

    #[test]
    fn missing_config_is_error_or_default() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
        assert_eq!(
            Config::discover_or_default(dir.path()).unwrap(),
            Config::default()
        );
    }

    #[test]
    fn paths_resolve_against_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_yaml("dir: out\nspa: true\n").unwrap();

        let site = config.site_settings(dir.path());
        assert_eq!(site.dir, dir.path().join("out"));
        assert!(site.spa);
        assert_eq!(
            config.templates_dir(dir.path()),
            dir.path().join(".hoist/stacks")
        );
    }
}

mod init {
    use super::*;

    #[test]
    fn writes_parseable_config() {
        let dir = tempfile::tempdir().unwrap();

        init_config(dir.path(), Some("example.com"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, false).unwrap();

        assert!(matches!(
            init_config(dir.path(), None, false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(dir.path(), Some("example.org"), true).unwrap();
        assert_eq!(
            Config::discover(dir.path()).unwrap().domain.as_deref(),
            Some("example.org")
        );
    }

    #[test]
    fn rejects_invalid_domain() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_config(dir.path(), Some("not a domain"), false).is_err());
        assert!(!dir.path().join(CONFIG_FILENAME).exists());
    }
}
