// ABOUTME: Settings and matching for the DNS delegation check.
// ABOUTME: Delegation is proven by a TXT record carrying the ownership marker.

use std::time::Duration;

/// Marker the domain template writes into its TXT record.
pub const DEFAULT_MARKER: &str = "hoist-site-verification";

/// How the delegation check polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsValidation {
    pub interval: Duration,
    /// Give up after this many lookups. `None` keeps trying until cancelled.
    pub max_attempts: Option<u32>,
    /// Give up after this long. `None` keeps trying until cancelled.
    pub timeout: Option<Duration>,
    pub marker: String,
}

impl Default for DnsValidation {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
            timeout: None,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl DnsValidation {
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Whether `attempt` was the last allowed lookup.
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

/// Case-insensitive search for `marker` across all TXT values.
pub fn contains_marker(records: &[String], marker: &str) -> bool {
    let marker = marker.to_lowercase();
    records
        .iter()
        .any(|record| record.to_lowercase().contains(&marker))
}
