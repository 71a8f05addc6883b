// ABOUTME: Analytics side channel for orchestration lifecycle events.
// ABOUTME: Reporters are best-effort and never block or fail a run.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Started,
    Error,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Deploy,
    Destroy,
}

/// One analytics event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub command: Command,
    pub session: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(kind: EventKind, command: Command, session: Uuid) -> Self {
        Self {
            kind,
            command,
            session,
            domain: None,
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.map(String::from);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receives analytics events. `record` must return promptly and swallow its
/// own failures.
pub trait EventReporter: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl EventReporter for NoopReporter {
    fn record(&self, _event: AnalyticsEvent) {}
}

/// Emits events as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl EventReporter for TracingReporter {
    fn record(&self, event: AnalyticsEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::debug!(target: "hoist::analytics", "{json}"),
            Err(e) => tracing::debug!(target: "hoist::analytics", "unserializable event: {e}"),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }
}

impl EventReporter for MemoryReporter {
    fn record(&self, event: AnalyticsEvent) {
        self.events.lock().push(event);
    }
}

/// Forwards events to a channel consumed elsewhere, dropping them when the
/// receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<AnalyticsEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AnalyticsEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventReporter for ChannelReporter {
    fn record(&self, event: AnalyticsEvent) {
        let _ = self.sender.send(event);
    }
}
