// ABOUTME: Diagnostics accumulator for non-fatal warnings during deploy and destroy.
// ABOUTME: Collects best-effort cleanup failures that shouldn't fail a run but should be shown to users.

/// Collects non-fatal warnings during an orchestration run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Certificate validation records could not be removed from the zone.
    pub fn record_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RecordCleanup,
            message: message.into(),
        }
    }

    /// The site bucket could not be emptied before teardown.
    pub fn bucket_empty(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::BucketEmpty,
            message: message.into(),
        }
    }

    /// The first web stack delete failed, as edge functions usually make it.
    pub fn web_delete(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::WebDelete,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to delete certificate validation records.
    RecordCleanup,
    /// Failed to empty the site bucket.
    BucketEmpty,
    /// First web stack delete did not complete.
    WebDelete,
}
