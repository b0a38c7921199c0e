use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    pub fn can_transition_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Idle, RunStatus::Running)
                | (
                    RunStatus::Running,
                    RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
                )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress hint shown next to the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Idle,
    Initializing,
    Diagnosing,
    GeneratingChallenges,
    Complete,
    Cancelled,
    TimedOut,
    Failed,
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Step::Idle => "",
            Step::Initializing => "Initializing Agent...",
            Step::Diagnosing => "Diagnosing Brief...",
            Step::GeneratingChallenges => "Generating Challenges...",
            Step::Complete => "Complete",
            Step::Cancelled => "Cancelled",
            Step::TimedOut => "Timed Out",
            Step::Failed => "Failed",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Bookkeeping for one run: status, timeline and terminal outcome.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    run_id: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    logs: Vec<String>,
    step: Step,
    error: Option<String>,
    session_id: Option<String>,
}

impl Default for GenerationRun {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            status: RunStatus::Idle,
            started_at: None,
            ended_at: None,
            logs: Vec::new(),
            step: Step::Idle,
            error: None,
            session_id: None,
        }
    }

    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.transition(RunStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Moves a running run to a terminal status. Fails if the run is not running,
    /// which is how a second terminal transition is rejected.
    pub fn finish(&mut self, status: RunStatus, error: Option<String>) -> Result<(), TransitionError> {
        if !status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: status,
            });
        }
        self.transition(status)?;
        self.ended_at = Some(Utc::now());
        self.error = error;
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    pub fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    pub fn set_session_id(&mut self, session_id: Option<String>) {
        if session_id.is_some() {
            self.session_id = session_id;
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
