use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::ControlConfig;
use crate::error::RunError;
use crate::presentation::RunView;
use crate::result::{ResultSnapshot, Statement};
use crate::settings::SettingsStore;
use crate::transport::{GenerationRequest, GenerationTransport};

use super::command::{AbortToken, RunCommand};
use super::driver::{DriverParts, RunDriver};
use super::state::{GenerationRun, Step};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub include_research: bool,
    pub selected_research_ids: Vec<String>,
}

impl RunOptions {
    pub fn with_research(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            include_research: true,
            selected_research_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

struct ActiveRun {
    token: AbortToken,
    edits: mpsc::Sender<RunCommand>,
    handle: JoinHandle<RunView>,
}

/// Starts, cancels and observes generation runs. At most one run is active per
/// controller; independent controllers share nothing.
pub struct RunController {
    transport: Arc<dyn GenerationTransport>,
    settings: Option<(Arc<dyn SettingsStore>, String)>,
    control: ControlConfig,
    view_tx: Arc<watch::Sender<RunView>>,
    active: Option<ActiveRun>,
}

impl RunController {
    pub fn new(transport: Arc<dyn GenerationTransport>, control: ControlConfig) -> Self {
        let (view_tx, _) = watch::channel(RunView::default());
        Self {
            transport,
            settings: None,
            control,
            view_tx: Arc::new(view_tx),
            active: None,
        }
    }

    /// Reads the generator configuration from `store` under `key` at every start.
    pub fn with_settings(mut self, store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        self.settings = Some((store, key.into()));
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<RunView> {
        self.view_tx.subscribe()
    }

    pub fn current(&self) -> RunView {
        self.view_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Starts a new run, cancelling the active one first. The returned token cancels
    /// this run only.
    pub async fn start(&mut self, brief: &str, options: RunOptions) -> Result<AbortToken, RunError> {
        if brief.trim().is_empty() {
            return Err(RunError::EmptyBrief);
        }
        if let Some(previous) = self.active.as_ref() {
            previous.token.abort();
            let view = self.wait().await?;
            tracing::debug!(
                target: "challenge_stream.run",
                run_id = view.run_id.as_deref().unwrap_or_default(),
                status = %view.status,
                "previous run closed before restart"
            );
        }

        let mut run = GenerationRun::new();
        run.begin()?;
        run.set_step(Step::Initializing);
        run.log("Initializing generation process...");
        run.log("Sending request to backend...");
        let generator_config = self.load_generator_config(run.run_id());
        if generator_config.is_some() {
            run.log("Loaded custom model configuration.");
        }

        let request = GenerationRequest::new(
            brief,
            options.include_research,
            options.selected_research_ids,
            generator_config,
        );
        self.view_tx
            .send_replace(RunView::capture(&run, &ResultSnapshot::new()));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (edit_tx, edit_rx) = mpsc::channel(self.control.command_buffer.max(1));
        let token = AbortToken::new(run.run_id().to_string(), cancel_tx);

        let driver = RunDriver::new(DriverParts {
            run,
            request,
            transport: Arc::clone(&self.transport),
            timeout: Duration::from_secs(self.control.timeout_secs),
            pacing: Duration::from_millis(self.control.pacing_ms),
            cancel_rx,
            edits: edit_rx,
            view_tx: Arc::clone(&self.view_tx),
        });
        let handle = tokio::spawn(driver.run());

        self.active = Some(ActiveRun {
            token: token.clone(),
            edits: edit_tx,
            handle,
        });
        Ok(token)
    }

    /// Cancels the active run and waits until its final state is published. A run that
    /// already ended keeps its outcome.
    pub async fn cancel(&mut self) -> Result<RunView, RunError> {
        match self.active.as_ref() {
            Some(active) => {
                active.token.abort();
                self.wait().await
            }
            None => Ok(self.current()),
        }
    }

    /// Waits for the active run to reach a terminal status.
    /// Dropping the returned future before it resolves leaves the run attached to the
    /// controller.
    pub async fn wait(&mut self) -> Result<RunView, RunError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(self.current());
        };
        let joined = (&mut active.handle).await;
        self.active = None;
        joined.map_err(RunError::Driver)
    }

    /// Replaces the text of a statement in the active run. The edit wins over any later
    /// generation event for the same id.
    pub async fn edit_statement(&self, id: u64, text: impl Into<String>) -> Result<(), RunError> {
        self.send(RunCommand::EditStatement {
            id,
            text: text.into(),
        })
        .await
    }

    /// Inserts or replaces a consumer-produced statement in the active run.
    pub async fn put_draft(&self, statement: Statement) -> Result<(), RunError> {
        self.send(RunCommand::PutDraft(statement)).await
    }

    async fn send(&self, cmd: RunCommand) -> Result<(), RunError> {
        let active = self.active.as_ref().ok_or(RunError::NoActiveRun)?;
        active
            .edits
            .send(cmd)
            .await
            .map_err(|_| RunError::NoActiveRun)
    }

    fn load_generator_config(&self, run_id: &str) -> Option<Value> {
        let (store, key) = self.settings.as_ref()?;
        match store.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    target: "challenge_stream.store",
                    run_id,
                    store = store.name(),
                    error = %err,
                    "ignoring unreadable generator config"
                );
                None
            }
        }
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        if let Some(active) = self.active.as_ref() {
            active.token.abort();
        }
    }
}
