// ABOUTME: Deterministic stack naming from stack kind, project, and branch.
// ABOUTME: Canonicalizes identifiers so the same inputs always yield the same stack name.

use std::fmt;
use thiserror::Error;

/// Separator used when canonicalizing identifiers.
const SEPARATOR: char = '-';

/// Branch used when the project is not under version control.
pub const DEFAULT_BRANCH: &str = "main";

/// Maximum stack name length accepted by CloudFormation.
const MAX_STACK_NAME_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackNameError {
    #[error("project name is empty after removing special characters: {0:?}")]
    EmptyProject(String),

    #[error("stack prefix cannot be empty")]
    EmptyPrefix,

    #[error("stack prefix must start with a letter: {0:?}")]
    PrefixStartsWithNonLetter(String),

    #[error("invalid character in stack prefix: '{0}'")]
    InvalidPrefixChar(char),

    #[error("stack name exceeds maximum length of 128 characters: {0}")]
    TooLong(String),
}

/// The kinds of stacks a site deployment is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    /// Hosted zone and ownership TXT record for a custom domain.
    Domain,
    /// Bucket, CDN distribution and edge functions serving the site.
    Web,
    /// TLS certificate and DNS alias pointing the domain at the distribution.
    Alias,
    /// Account-wide shared resources. Not tied to a project or branch.
    Support,
}

impl StackKind {
    pub const ALL: [StackKind; 4] = [
        StackKind::Domain,
        StackKind::Web,
        StackKind::Alias,
        StackKind::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::Domain => "domain",
            StackKind::Web => "web",
            StackKind::Alias => "alias",
            StackKind::Support => "support",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote stack name. Only produced by [`StackNaming`] or parsed from
/// provider responses, never assembled by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackName(String);

impl StackName {
    /// Wrap a stack name reported by the provider.
    pub fn from_remote(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse every run of non-alphanumeric characters into a single separator
/// and trim separators from both ends.
///
/// `user/branch_name` becomes `user-branch-name`, `@scope/pkg` becomes
/// `scope-pkg`.
pub fn canonicalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push(SEPARATOR);
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// The project/branch pair every stack name is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    project: String,
    branch: String,
}

impl ProjectIdentity {
    /// Build an identity from raw project and branch names.
    ///
    /// A missing or empty branch falls back to `main`.
    pub fn new(project: &str, branch: Option<&str>) -> Result<Self, StackNameError> {
        let canonical_project = canonicalize(project);
        if canonical_project.is_empty() {
            return Err(StackNameError::EmptyProject(project.to_string()));
        }

        let canonical_branch = branch.map(canonicalize).unwrap_or_default();
        let branch = if canonical_branch.is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            canonical_branch
        };

        Ok(Self {
            project: canonical_project,
            branch,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

/// Produces stack names for one project/branch under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNaming {
    prefix: String,
    identity: ProjectIdentity,
}

impl StackNaming {
    pub fn new(prefix: &str, identity: ProjectIdentity) -> Result<Self, StackNameError> {
        validate_prefix(prefix)?;
        Ok(Self {
            prefix: prefix.to_string(),
            identity,
        })
    }

    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `{prefix}-{kind}-{project}-{branch}`, or the fixed `{prefix}-support`
    /// for the shared support stack.
    pub fn stack_name(&self, kind: StackKind) -> Result<StackName, StackNameError> {
        let name = match kind {
            StackKind::Support => format!("{}-{}", self.prefix, kind),
            _ => format!(
                "{}-{}-{}-{}",
                self.prefix, kind, self.identity.project, self.identity.branch
            ),
        };

        if name.len() > MAX_STACK_NAME_LEN {
            return Err(StackNameError::TooLong(name));
        }

        Ok(StackName(name))
    }
}

/// Validate a stack prefix. Prefixes start with a letter and contain only
/// ASCII letters, digits and hyphens.
pub fn validate_prefix(prefix: &str) -> Result<(), StackNameError> {
    let mut chars = prefix.chars();
    let first = chars.next().ok_or(StackNameError::EmptyPrefix)?;
    if !first.is_ascii_alphabetic() {
        return Err(StackNameError::PrefixStartsWithNonLetter(prefix.to_string()));
    }

    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(StackNameError::InvalidPrefixChar(c));
        }
    }

    Ok(())
}
