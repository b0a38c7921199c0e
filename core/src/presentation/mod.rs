//! Consumer-facing view of a run.
//!
//! [`RunView`] is the immutable snapshot published on every change; [`GenerationSession`]
//! wraps a [`RunController`] with the accessors a UI binds to.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::RunError;
use crate::result::{ResultSnapshot, Statement};
use crate::run::{AbortToken, GenerationRun, RunController, RunOptions, RunStatus, Step};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunView {
    pub run_id: Option<String>,
    pub status: RunStatus,
    pub result: ResultSnapshot,
    pub logs: Vec<String>,
    pub current_step: Step,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
}

impl RunView {
    pub(crate) fn capture(run: &GenerationRun, snapshot: &ResultSnapshot) -> Self {
        Self {
            run_id: Some(run.run_id().to_string()),
            status: run.status(),
            result: snapshot.clone(),
            logs: run.logs().to_vec(),
            current_step: run.step(),
            error: run.error().map(str::to_string),
            started_at: run.started_at(),
            ended_at: run.ended_at(),
            session_id: run.session_id().map(str::to_string),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }
}

/// Binds a controller to the shape an interactive front end expects.
pub struct GenerationSession {
    controller: RunController,
    views: watch::Receiver<RunView>,
}

impl GenerationSession {
    pub fn new(controller: RunController) -> Self {
        let views = controller.subscribe();
        Self { controller, views }
    }

    pub async fn start(
        &mut self,
        brief_text: &str,
        include_research: bool,
        selected_research_ids: Vec<String>,
    ) -> Result<AbortToken, RunError> {
        let options = RunOptions {
            include_research,
            selected_research_ids,
        };
        self.controller.start(brief_text, options).await
    }

    pub async fn cancel(&mut self) -> Result<RunView, RunError> {
        self.controller.cancel().await
    }

    pub async fn wait(&mut self) -> Result<RunView, RunError> {
        self.controller.wait().await
    }

    pub async fn edit_statement(&self, id: u64, text: &str) -> Result<(), RunError> {
        self.controller.edit_statement(id, text).await
    }

    pub async fn put_draft(&self, statement: Statement) -> Result<(), RunError> {
        self.controller.put_draft(statement).await
    }

    /// Resolves once a newer view than the last one returned is published.
    /// Returns `None` when the controller is gone.
    pub async fn changed(&mut self) -> Option<RunView> {
        self.views.changed().await.ok()?;
        Some(self.views.borrow_and_update().clone())
    }

    pub fn view(&self) -> RunView {
        self.views.borrow().clone()
    }

    pub fn status(&self) -> RunStatus {
        self.views.borrow().status
    }

    pub fn result(&self) -> ResultSnapshot {
        self.views.borrow().result.clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.views.borrow().logs.clone()
    }

    pub fn current_step(&self) -> Step {
        self.views.borrow().current_step
    }

    pub fn error(&self) -> Option<String> {
        self.views.borrow().error.clone()
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }
}
