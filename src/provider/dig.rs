// ABOUTME: TXT record resolution through the dig command.
// ABOUTME: Observes public DNS, so results reflect registrar delegation rather than the provider's view.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{ProviderError, TxtResolver};

#[derive(Debug, Clone)]
pub struct DigResolver {
    program: String,
}

impl Default for DigResolver {
    fn default() -> Self {
        Self {
            program: "dig".to_string(),
        }
    }
}

impl DigResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TxtResolver for DigResolver {
    async fn resolve_txt(&self, domain: &str) -> Result<Vec<String>, ProviderError> {
        let output = Command::new(&self.program)
            .args(["+short", "TXT", domain])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ProviderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProviderError::request(
                format!("dig TXT {}", domain),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(parse_txt_answers(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Join the quoted character strings of each answer line into one value.
fn parse_txt_answers(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .map(|line| {
            let mut value = String::new();
            let mut in_quotes = false;
            let mut escaped = false;
            for c in line.chars() {
                match c {
                    _ if escaped => {
                        value.push(c);
                        escaped = false;
                    }
                    '\\' if in_quotes => escaped = true,
                    '"' => in_quotes = !in_quotes,
                    _ if in_quotes => value.push(c),
                    _ => {}
                }
            }
            value
        })
        .collect()
}
