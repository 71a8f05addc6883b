// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::{ProgressEvent, StepOutcome};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Render one orchestration progress event.
    pub fn event(&self, event: &ProgressEvent) {
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Normal => match event {
                ProgressEvent::PhaseChanged(_) => {}
                ProgressEvent::StepStarted(step) => println!("  → {}...", step.label()),
                ProgressEvent::StepFinished(report) => match &report.outcome {
                    StepOutcome::Success => println!("  ✓ {}", report.step.label()),
                    StepOutcome::Skipped => {}
                    StepOutcome::Failure(failure) => {
                        println!("  ✗ {}: {}", report.step.label(), failure.message)
                    }
                },
                ProgressEvent::Nameservers(nameservers) => {
                    println!();
                    println!("  Configure your domain registrar with the following nameservers:");
                    println!();
                    for ns in nameservers {
                        println!("    {ns}");
                    }
                    println!();
                }
            },
            OutputMode::Json => {
                let line = match event {
                    ProgressEvent::PhaseChanged(phase) => JsonProgress {
                        event: "phase",
                        step: None,
                        detail: Some(format!("{:?}", phase)),
                        nameservers: None,
                    },
                    ProgressEvent::StepStarted(step) => JsonProgress {
                        event: "step_started",
                        step: Some(step.label()),
                        detail: None,
                        nameservers: None,
                    },
                    ProgressEvent::StepFinished(report) => JsonProgress {
                        event: "step_finished",
                        step: Some(report.step.label()),
                        detail: Some(match &report.outcome {
                            StepOutcome::Success => "success".to_string(),
                            StepOutcome::Skipped => "skipped".to_string(),
                            StepOutcome::Failure(failure) => failure.to_string(),
                        }),
                        nameservers: None,
                    },
                    ProgressEvent::Nameservers(nameservers) => JsonProgress {
                        event: "nameservers",
                        step: None,
                        detail: None,
                        nameservers: Some(nameservers.as_slice()),
                    },
                };
                if let Ok(json) = serde_json::to_string(&line) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "warning",
                    message,
                    duration_secs: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "success",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonProgress<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nameservers: Option<&'a [String]>,
}
