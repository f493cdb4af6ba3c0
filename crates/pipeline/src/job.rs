//! The job state machine.
//!
//! A job is mutated only by the driver executing it; everyone else sees
//! cloned snapshots. Transitions are enforced here so a buggy caller gets a
//! [`JobError`] instead of an inconsistent record: steps complete strictly
//! in index order, at most one step is in progress, terminal states are
//! final, and progress never moves backwards or past 100.

use chrono::{DateTime, Utc};
use serde::Serialize;

use launchkit_core::{JobId, TenantId};

/// Overall job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Status of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One ordered phase of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub index: usize,
    pub title: String,
    pub status: StepStatus,
}

/// Log severity, as surfaced to polling clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Immutable entry in a job's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

/// Illegal state-machine transition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job is terminal; no further transitions allowed")]
    Terminal,

    #[error("step index {0} out of range")]
    StepOutOfRange(usize),

    #[error("step {index} cannot transition from {from:?}")]
    InvalidTransition { index: usize, from: StepStatus },

    #[error("step {0} cannot start before its predecessor completes")]
    OutOfOrder(usize),
}

/// One run of the generation pipeline.
///
/// In-memory only by design: a process restart abandons in-flight jobs while
/// their durable output (tenants) is re-hydrated separately.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    pub status: JobStatus,
    pub progress: u8,
    pub steps: Vec<Step>,
    pub logs: Vec<LogEntry>,
    pub result_tenant_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a job with the given step titles: `processing`, first step in
    /// progress, the rest pending, progress 0.
    pub fn new(prompt: impl Into<String>, step_titles: &[&str]) -> Self {
        let steps = step_titles
            .iter()
            .enumerate()
            .map(|(index, title)| Step {
                index,
                title: (*title).to_string(),
                status: if index == 0 {
                    StepStatus::InProgress
                } else {
                    StepStatus::Pending
                },
            })
            .collect();

        Self {
            id: JobId::new(),
            prompt: prompt.into(),
            status: JobStatus::Processing,
            progress: 0,
            steps,
            logs: Vec::new(),
            result_tenant_id: None,
            created_at: Utc::now(),
        }
    }

    /// Mark step `index` in progress.
    ///
    /// No-op if it already is (the first step starts in progress, and
    /// completing a step auto-advances the next one).
    pub fn begin_step(&mut self, index: usize) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal);
        }
        let prev_completed =
            index == 0 || self.steps.get(index - 1).map(|s| s.status) == Some(StepStatus::Completed);
        let step = self
            .steps
            .get_mut(index)
            .ok_or(JobError::StepOutOfRange(index))?;

        match step.status {
            StepStatus::InProgress => Ok(()),
            StepStatus::Pending if prev_completed => {
                step.status = StepStatus::InProgress;
                Ok(())
            }
            StepStatus::Pending => Err(JobError::OutOfOrder(index)),
            from => Err(JobError::InvalidTransition { index, from }),
        }
    }

    /// Complete step `index`; the next step (if any) becomes in progress,
    /// and completing the final step completes the job.
    pub fn complete_step(&mut self, index: usize) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal);
        }
        let step = self
            .steps
            .get_mut(index)
            .ok_or(JobError::StepOutOfRange(index))?;

        if step.status != StepStatus::InProgress {
            return Err(JobError::InvalidTransition {
                index,
                from: step.status,
            });
        }
        step.status = StepStatus::Completed;

        if let Some(next) = self.steps.get_mut(index + 1) {
            next.status = StepStatus::InProgress;
        } else {
            self.status = JobStatus::Completed;
        }
        Ok(())
    }

    /// Append to the job log. O(1); entries are never reordered or removed.
    pub fn append_log(&mut self, message: impl Into<String>, severity: Severity) {
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            message: message.into(),
            severity,
        });
    }

    /// Fail the job: the active step becomes failed, a human-readable reason
    /// is appended as the final log entry, and every later transition is
    /// rejected.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal);
        }
        let reason = reason.into();
        if let Some(step) = self
            .steps
            .iter_mut()
            .find(|s| s.status == StepStatus::InProgress)
        {
            step.status = StepStatus::Failed;
        }
        self.status = JobStatus::Failed;
        self.append_log(reason, Severity::Error);
        Ok(())
    }

    /// Raise progress to `value` (clamped to 100). Decreases are ignored, as
    /// is any update after the job reached a terminal state.
    pub fn set_progress(&mut self, value: u8) {
        if self.status.is_terminal() {
            return;
        }
        let value = value.min(100);
        if value > self.progress {
            self.progress = value;
        }
    }

    /// At most one step may be in progress at any instant.
    pub fn active_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::InProgress)
    }
}
