// ABOUTME: Cloud provider backed by the aws command-line tool.
// ABOUTME: Each operation runs one aws invocation and parses its JSON output.

mod acm;
mod cloudformation;
mod cloudfront;
mod route53;
mod s3;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::process::Stdio;
use tokio::process::Command;

use super::ProviderError;

/// Certificates attached to CDN distributions must live in this region.
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// Default program name for the command-line tool.
pub const DEFAULT_PROGRAM: &str = "aws";

/// Runs aws subcommands with a fixed profile and region.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    profile: Option<String>,
    region: String,
}

impl AwsCli {
    pub fn new(profile: Option<String>, region: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            profile,
            region: region.into(),
        }
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Run `aws {service} {operation} {args..}` and return stdout.
    pub(crate) async fn call(
        &self,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<String, ProviderError> {
        self.call_in(&self.region, service, operation, args).await
    }

    pub(crate) async fn call_in(
        &self,
        region: &str,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<String, ProviderError> {
        let name = format!("{} {}", service, operation);
        tracing::debug!("running {} {}", self.program, name);

        let mut command = Command::new(&self.program);
        command
            .arg(service)
            .arg(operation)
            .args(args)
            .args(["--output", "json", "--region", region])
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(profile) = &self.profile {
            command.args(["--profile", profile]);
        }

        let output = command
            .output()
            .await
            .map_err(|source| ProviderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_failure(&name, stderr))
    }

    /// Like [`call`](Self::call), parsing stdout as JSON.
    pub(crate) async fn call_json<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<T, ProviderError> {
        let stdout = self.call(service, operation, args).await?;
        parse_json(service, operation, &stdout)
    }
}

fn parse_json<T: DeserializeOwned>(
    service: &str,
    operation: &str,
    stdout: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(stdout)
        .map_err(|e| ProviderError::malformed(format!("{} {}", service, operation), e.to_string()))
}

/// The service error code in `An error occurred (Code) when calling ...`.
fn error_code(stderr: &str) -> Option<&str> {
    const MARKER: &str = "An error occurred (";
    let start = stderr.find(MARKER)? + MARKER.len();
    let len = stderr[start..].find(')')?;
    Some(&stderr[start..start + len])
}

/// Map a failed invocation to a not-found or request error. Only the service
/// error code decides; CloudFormation reports missing stacks as a
/// `ValidationError` ending in "does not exist".
fn classify_failure(operation: &str, stderr: String) -> ProviderError {
    let not_found = match error_code(&stderr) {
        Some(code) => {
            code.starts_with("NoSuch")
                || code.ends_with("NotFound")
                || code.ends_with("NotFoundException")
                || (code == "ValidationError" && stderr.trim_end().ends_with("does not exist"))
        }
        None => false,
    };

    if not_found {
        ProviderError::NotFound(operation.to_string())
    } else {
        ProviderError::request(operation, stderr)
    }
}

/// Write a request document to a temporary file and return the file along
/// with the `file://` argument that references it. The file is removed when
/// the returned handle drops.
pub(crate) fn input_file<T: Serialize>(
    document: &T,
) -> Result<(tempfile::NamedTempFile, String), ProviderError> {
    let file = tempfile::Builder::new()
        .prefix("hoist-")
        .suffix(".json")
        .tempfile()?;
    serde_json::to_writer(file.as_file(), document)
        .map_err(|e| ProviderError::malformed("request encoding", e.to_string()))?;
    let arg = format!("file://{}", file.path().display());
    Ok((file, arg))
}

pub(crate) fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
