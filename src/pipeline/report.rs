//! Per-step records and the end-of-run summary.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::Options;
use crate::steps::{StepError, StepOutcome, StepStatus};

use super::{Severity, Step};

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: &'static str,
    pub severity: Severity,
    pub status: StepStatus,
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl StepRecord {
    pub(super) fn not_requested(step: &Step) -> Self {
        Self {
            name: step.name,
            severity: step.severity,
            status: StepStatus::Skipped,
            detail: Some("not requested".to_string()),
            elapsed_ms: 0,
        }
    }

    pub(super) fn from_outcome(step: &Step, outcome: StepOutcome, elapsed: Duration) -> Self {
        Self {
            name: step.name,
            severity: step.severity,
            status: outcome.status,
            detail: outcome.detail,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub(super) fn failed(step: &Step, status: StepStatus, err: &StepError, elapsed: Duration) -> Self {
        Self {
            name: step.name,
            severity: step.severity,
            status,
            detail: Some(err.to_string()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Results of one provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub options: Options,
    pub steps: Vec<StepRecord>,
    /// Name of the fatal step that ended the run early.
    pub aborted_at: Option<String>,
    pub exit_code: i32,
}

impl RunReport {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            steps: Vec::new(),
            aborted_at: None,
            exit_code: 0,
        }
    }

    pub(super) fn push(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub(super) fn abort(&mut self, step: &str, exit_code: i32) {
        self.aborted_at = Some(step.to_string());
        self.exit_code = exit_code;
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }

    fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        Ok(())
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("\n=== Provisioning Summary ===\n");

        for step in &self.steps {
            let (icon, label) = match step.status {
                StepStatus::Ok => ("✓", "OK"),
                StepStatus::Unchanged => ("✓", "UNCHANGED"),
                StepStatus::Warn => ("⚠", "WARN"),
                StepStatus::Skipped => ("○", "SKIP"),
                StepStatus::Failed => ("✗", "FAIL"),
            };

            print!("  {} [{}] {}", icon, label, step.name);
            if let Some(detail) = &step.detail {
                println!(": {}", detail);
            } else {
                println!();
            }
        }

        println!();
        let done = self.count(StepStatus::Ok) + self.count(StepStatus::Unchanged);
        println!("Summary: {}/{} steps done", done, self.steps.len());
        let warned = self.count(StepStatus::Warn);
        if warned > 0 {
            println!("         {} with warnings", warned);
        }
        let failed = self.count(StepStatus::Failed);
        if failed > 0 {
            println!("         {} failed", failed);
        }
        match &self.aborted_at {
            Some(step) => println!("Aborted at '{}' (exit code {})", step, self.exit_code),
            None => println!("Provisioning complete."),
        }
    }
}
