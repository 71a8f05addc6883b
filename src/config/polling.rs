// ABOUTME: Polling and DNS validation settings for hoist.yml.
// ABOUTME: Durations are humantime strings such as "5s" or "60m".

use serde::Deserialize;
use std::time::Duration;

use crate::deploy::{DEFAULT_MARKER, DnsValidation, PollingSettings};
use crate::stack::PollSchedule;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_stack_interval", with = "humantime_serde")]
    pub stack_interval: Duration,

    #[serde(default = "default_stack_timeout", with = "humantime_serde")]
    pub stack_timeout: Duration,

    #[serde(default = "default_change_set_interval", with = "humantime_serde")]
    pub change_set_interval: Duration,

    #[serde(default = "default_change_set_timeout", with = "humantime_serde")]
    pub change_set_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            stack_interval: default_stack_interval(),
            stack_timeout: default_stack_timeout(),
            change_set_interval: default_change_set_interval(),
            change_set_timeout: default_change_set_timeout(),
        }
    }
}

impl PollingConfig {
    pub fn settings(&self) -> PollingSettings {
        PollingSettings {
            stack: PollSchedule::new(self.stack_interval, Some(self.stack_timeout)),
            change_set: PollSchedule::new(self.change_set_interval, Some(self.change_set_timeout)),
        }
    }
}

fn default_stack_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_stack_timeout() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_change_set_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_change_set_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

/// DNS delegation check. Unbounded unless `max_attempts` or `timeout` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsValidationConfig {
    #[serde(default = "default_dns_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default)]
    pub max_attempts: Option<u32>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for DnsValidationConfig {
    fn default() -> Self {
        Self {
            interval: default_dns_interval(),
            max_attempts: None,
            timeout: None,
        }
    }
}

impl DnsValidationConfig {
    pub fn settings(&self, marker: Option<&str>) -> DnsValidation {
        DnsValidation {
            interval: self.interval,
            max_attempts: self.max_attempts,
            timeout: self.timeout,
            marker: marker.unwrap_or(DEFAULT_MARKER).to_string(),
        }
    }
}

fn default_dns_interval() -> Duration {
    Duration::from_secs(1)
}
