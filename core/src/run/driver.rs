use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};

use crate::error::TransportError;
use crate::presentation::RunView;
use crate::protocol::{FrameDecoder, StreamEvent};
use crate::result::{reduce, Reduced, ResultSnapshot, RunSignal};
use crate::transport::{ByteStream, GenerationRequest, GenerationTransport};

use super::command::{cancel_requested, RunCommand};
use super::state::{GenerationRun, RunStatus, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct InFlight {
    stream: ByteStream,
    opened_at: Instant,
    bytes: u64,
}

async fn next_chunk(in_flight: &mut Option<InFlight>) -> Option<Result<Bytes, TransportError>> {
    match in_flight {
        Some(req) => req.stream.next().await,
        None => std::future::pending().await,
    }
}

pub(crate) struct DriverParts {
    pub run: GenerationRun,
    pub request: GenerationRequest,
    pub transport: Arc<dyn GenerationTransport>,
    pub timeout: Duration,
    pub pacing: Duration,
    pub cancel_rx: watch::Receiver<bool>,
    pub edits: mpsc::Receiver<RunCommand>,
    pub view_tx: Arc<watch::Sender<RunView>>,
}

/// Owns one run from request to terminal status. All state changes happen on this
/// task; cancel, timeout and stream outcomes all end in [`RunDriver::close`].
pub(crate) struct RunDriver {
    run: GenerationRun,
    snapshot: ResultSnapshot,
    decoder: FrameDecoder,
    request: GenerationRequest,
    transport: Arc<dyn GenerationTransport>,
    in_flight: Option<InFlight>,
    deadline: Pin<Box<Sleep>>,
    timeout: Duration,
    pacing: Duration,
    cancel_rx: watch::Receiver<bool>,
    edits: mpsc::Receiver<RunCommand>,
    edits_open: bool,
    view_tx: Arc<watch::Sender<RunView>>,
}

impl RunDriver {
    /// Arms the timeout immediately.
    pub(crate) fn new(parts: DriverParts) -> Self {
        Self {
            run: parts.run,
            snapshot: ResultSnapshot::new(),
            decoder: FrameDecoder::new(),
            request: parts.request,
            transport: parts.transport,
            in_flight: None,
            deadline: Box::pin(tokio::time::sleep(parts.timeout)),
            timeout: parts.timeout,
            pacing: parts.pacing,
            cancel_rx: parts.cancel_rx,
            edits: parts.edits,
            edits_open: true,
            view_tx: parts.view_tx,
        }
    }

    pub(crate) async fn run(mut self) -> RunView {
        tracing::info!(
            target: "challenge_stream.run",
            run_id = %self.run.run_id(),
            transport = self.transport.name(),
            timeout_secs = self.timeout.as_secs(),
            "run started"
        );

        if self.connect().await == Flow::Continue {
            self.consume().await;
        }
        // Normally already done by `close`; covers an exit without a terminal status.
        self.teardown();

        tracing::info!(
            target: "challenge_stream.run",
            run_id = %self.run.run_id(),
            status = %self.run.status(),
            statements = self.snapshot.len(),
            frames = self.decoder.decoded_count(),
            malformed_frames = self.decoder.malformed_count(),
            "run finished"
        );
        self.view()
    }

    async fn connect(&mut self) -> Flow {
        let transport = Arc::clone(&self.transport);
        let request = self.request.clone();
        let open = transport.open(&request);
        tokio::pin!(open);

        loop {
            tokio::select! {
                biased;
                _ = cancel_requested(&mut self.cancel_rx) => return self.cancel(),
                _ = self.deadline.as_mut() => return self.time_out(),
                cmd = self.edits.recv(), if self.edits_open => self.on_edit(cmd),
                opened = &mut open => {
                    return match opened {
                        Ok(stream) => {
                            self.in_flight = Some(InFlight {
                                stream,
                                opened_at: Instant::now(),
                                bytes: 0,
                            });
                            self.run.log("Connection established. Receiving stream...");
                            self.run.set_step(Step::Diagnosing);
                            self.publish();
                            Flow::Continue
                        }
                        Err(err) if err.is_abort() => {
                            self.external_abort();
                            Flow::Continue
                        }
                        Err(err) => self.fail(err.to_string()),
                    };
                }
            }
        }
    }

    async fn consume(&mut self) {
        loop {
            let flow = tokio::select! {
                biased;
                _ = cancel_requested(&mut self.cancel_rx) => self.cancel(),
                _ = self.deadline.as_mut() => self.time_out(),
                cmd = self.edits.recv(), if self.edits_open => {
                    self.on_edit(cmd);
                    Flow::Continue
                }
                chunk = next_chunk(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.on_chunk(chunk).await
                }
            };
            if flow == Flow::Stop {
                return;
            }
        }
    }

    async fn on_chunk(&mut self, chunk: Option<Result<Bytes, TransportError>>) -> Flow {
        match chunk {
            Some(Ok(bytes)) => {
                if let Some(req) = self.in_flight.as_mut() {
                    req.bytes += bytes.len() as u64;
                }
                for raw in self.decoder.decode(&bytes) {
                    let kind = raw.kind.clone();
                    match StreamEvent::from_raw(raw) {
                        Ok(event) => {
                            if self.apply(event).await == Flow::Stop {
                                return Flow::Stop;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                target: "challenge_stream.run",
                                run_id = %self.run.run_id(),
                                kind = %kind,
                                error = %err,
                                "skipping undecodable event"
                            );
                        }
                    }
                }
                Flow::Continue
            }
            Some(Err(err)) if err.is_abort() => {
                self.external_abort();
                Flow::Continue
            }
            Some(Err(err)) => self.fail(err.to_string()),
            None => {
                self.decoder.finish();
                self.fail("Stream ended before completion".to_string())
            }
        }
    }

    async fn apply(&mut self, event: StreamEvent) -> Flow {
        if matches!(event, StreamEvent::ChallengeGeneration(_))
            && !self.pacing.is_zero()
            && self.pace().await == Flow::Stop
        {
            return Flow::Stop;
        }

        let Reduced {
            snapshot,
            log,
            step,
            signal,
        } = reduce(std::mem::take(&mut self.snapshot), &event);
        self.snapshot = snapshot;
        if let Some(line) = log {
            self.run.log(line);
        }
        if let Some(step) = step {
            self.run.set_step(step);
        }

        match signal {
            Some(RunSignal::Complete { session_id }) => {
                self.run.set_session_id(session_id);
                self.close(RunStatus::Succeeded, None, Step::Complete, None)
            }
            Some(RunSignal::Failed { message }) => self.fail(message),
            None => {
                self.publish();
                Flow::Continue
            }
        }
    }

    /// Presentation delay before a generated statement is published. Cancellation,
    /// timeout and local edits are still served while waiting.
    async fn pace(&mut self) -> Flow {
        let pause = tokio::time::sleep(self.pacing);
        tokio::pin!(pause);
        loop {
            tokio::select! {
                biased;
                _ = cancel_requested(&mut self.cancel_rx) => return self.cancel(),
                _ = self.deadline.as_mut() => return self.time_out(),
                cmd = self.edits.recv(), if self.edits_open => self.on_edit(cmd),
                _ = &mut pause => return Flow::Continue,
            }
        }
    }

    fn on_edit(&mut self, cmd: Option<RunCommand>) {
        match cmd {
            Some(RunCommand::EditStatement { id, text }) => {
                if self.snapshot.edit_text(id, text) {
                    self.publish();
                } else {
                    tracing::debug!(
                        target: "challenge_stream.run",
                        run_id = %self.run.run_id(),
                        id,
                        "edit for unknown statement ignored"
                    );
                }
            }
            Some(RunCommand::PutDraft(statement)) => {
                self.snapshot.put_local(statement);
                self.publish();
            }
            None => self.edits_open = false,
        }
    }

    /// The request went away underneath us. The run stays as it is; the caller's
    /// cancel or the timeout still decide the outcome.
    fn external_abort(&mut self) {
        self.in_flight = None;
        tracing::debug!(
            target: "challenge_stream.run",
            run_id = %self.run.run_id(),
            "request aborted outside the controller"
        );
    }

    fn cancel(&mut self) -> Flow {
        self.close(
            RunStatus::Cancelled,
            None,
            Step::Cancelled,
            Some("Process cancelled by user.".to_string()),
        )
    }

    fn time_out(&mut self) -> Flow {
        let message = format!(
            "Request timed out after {} seconds.",
            self.timeout.as_secs()
        );
        self.close(
            RunStatus::Failed,
            Some(message),
            Step::TimedOut,
            Some("Error: Request timed out.".to_string()),
        )
    }

    fn fail(&mut self, message: String) -> Flow {
        let log = format!("Error: {message}");
        self.close(RunStatus::Failed, Some(message), Step::Failed, Some(log))
    }

    /// Single exit point: at most one terminal transition per run, and the in-flight
    /// request is released exactly once.
    fn close(
        &mut self,
        status: RunStatus,
        error: Option<String>,
        step: Step,
        log: Option<String>,
    ) -> Flow {
        if let Err(err) = self.run.finish(status, error) {
            tracing::debug!(
                target: "challenge_stream.run",
                run_id = %self.run.run_id(),
                error = %err,
                "ignoring transition on a finished run"
            );
            return Flow::Stop;
        }
        if let Some(line) = log {
            self.run.log(line);
        }
        self.run.set_step(step);
        self.teardown();
        if status == RunStatus::Failed {
            tracing::warn!(
                target: "challenge_stream.run",
                run_id = %self.run.run_id(),
                error = self.run.error().unwrap_or_default(),
                "run failed"
            );
        }
        self.publish();
        Flow::Stop
    }

    fn teardown(&mut self) {
        if let Some(req) = self.in_flight.take() {
            tracing::debug!(
                target: "challenge_stream.run",
                run_id = %self.run.run_id(),
                bytes = req.bytes,
                open_ms = req.opened_at.elapsed().as_millis() as u64,
                "releasing in-flight request"
            );
            drop(req.stream);
        }
    }

    fn view(&self) -> RunView {
        RunView::capture(&self.run, &self.snapshot)
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}
