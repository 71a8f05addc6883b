// ABOUTME: Stack templates, descriptors, and parameter resolution.
// ABOUTME: Templates are opaque bodies; only their declared Parameters section is inspected.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::error::StackError;
use crate::types::{StackKind, StackName};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A parameter declared by a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    /// Declared default, rendered as the provider would receive it.
    pub default: Option<String>,
}

/// A parameter value sent with a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    pub key: String,
    pub value: String,
}

/// An infrastructure template: the raw body submitted to the provider plus
/// the parameters it declares.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    body: String,
    parameters: BTreeMap<String, ParameterDecl>,
}

#[derive(Debug, Deserialize)]
struct TemplateHeader {
    #[serde(rename = "Parameters", default)]
    parameters: BTreeMap<String, RawParameter>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    #[serde(rename = "Default", default)]
    default: Option<serde_yaml::Value>,
}

impl Template {
    /// Parse a YAML or JSON template body.
    pub fn parse(name: &str, body: impl Into<String>) -> Result<Self, TemplateError> {
        let body = body.into();
        let header: TemplateHeader =
            serde_yaml::from_str(&body).map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source,
            })?;

        let parameters = header
            .parameters
            .into_iter()
            .map(|(key, raw)| {
                let decl = ParameterDecl {
                    default: raw.default.as_ref().map(render_default),
                };
                (key, decl)
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            body,
            parameters,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParameterDecl> {
        &self.parameters
    }

    /// Resolve supplied values against the declared parameters.
    ///
    /// Supplied values win, declared defaults apply otherwise (the parameter
    /// is omitted so the template's own default is used), and anything left
    /// without a value is reported together as a configuration error.
    /// Supplied keys the template does not declare are passed through so the
    /// provider reports the typo.
    pub fn resolve(
        &self,
        stack: &StackName,
        supplied: &StackParameters,
    ) -> Result<Vec<ParameterValue>, StackError> {
        let mut values = Vec::new();
        let mut missing = Vec::new();

        for (key, decl) in &self.parameters {
            match supplied.get(key) {
                Some(value) => values.push(ParameterValue {
                    key: key.clone(),
                    value: value.to_string(),
                }),
                None if decl.default.is_some() => {}
                None => missing.push(key.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(StackError::MissingParameters {
                stack: stack.clone(),
                names: missing,
            });
        }

        for (key, value) in supplied.iter() {
            if !self.parameters.contains_key(key) {
                values.push(ParameterValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(values)
    }
}

fn render_default(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(render_default)
            .collect::<Vec<_>>()
            .join(","),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Parameters supplied for a stack. Keys set to `None` are omitted entirely
/// so the template's declared default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackParameters(BTreeMap<String, Option<String>>);

impl StackParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, or leave it unset when `value` is `None`.
    pub fn set<V: Into<String>>(mut self, key: &str, value: Option<V>) -> Self {
        self.0.insert(key.to_string(), value.map(Into::into));
        self
    }

    /// The defined value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Iterate over parameters that have a value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }
}

/// Everything needed to deploy one stack. Immutable once built.
#[derive(Debug, Clone)]
pub struct StackDescriptor {
    pub stack_name: StackName,
    pub parameters: StackParameters,
    pub template: Arc<Template>,
}

impl StackDescriptor {
    pub fn new(stack_name: StackName, template: Arc<Template>, parameters: StackParameters) -> Self {
        Self {
            stack_name,
            parameters,
            template,
        }
    }
}

/// Supplies the template for each stack kind.
pub trait TemplateSource: Send + Sync {
    fn load(&self, kind: StackKind) -> Result<Arc<Template>, TemplateError>;
}

/// Reads `{dir}/{kind}.yaml` templates from disk.
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    dir: PathBuf,
}

impl FileTemplateSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, kind: StackKind) -> PathBuf {
        self.dir.join(format!("{}.yaml", kind))
    }
}

impl TemplateSource for FileTemplateSource {
    fn load(&self, kind: StackKind) -> Result<Arc<Template>, TemplateError> {
        let path = self.path_for(kind);
        let body = std::fs::read_to_string(&path).map_err(|source| TemplateError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("loaded {} template from {}", kind, path.display());
        Template::parse(kind.as_str(), body).map(Arc::new)
    }
}
