use std::sync::Arc;

use tokio::sync::watch;

use crate::result::Statement;

/// Consumer-side mutations routed to the run driver, the only owner of the snapshot.
#[derive(Debug)]
pub(crate) enum RunCommand {
    EditStatement { id: u64, text: String },
    PutDraft(Statement),
}

/// Handle that cancels one run from anywhere. Cloneable; every clone refers to the same
/// run. Once the run has ended the token is inert.
#[derive(Debug, Clone)]
pub struct AbortToken {
    run_id: String,
    cancel: Arc<watch::Sender<bool>>,
}

impl AbortToken {
    pub(crate) fn new(run_id: String, cancel: watch::Sender<bool>) -> Self {
        Self {
            run_id,
            cancel: Arc::new(cancel),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Requests cancellation. Returns false when the run had already ended.
    pub fn abort(&self) -> bool {
        if self.cancel.is_closed() {
            return false;
        }
        self.cancel.send_replace(true);
        true
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_closed()
    }
}

/// Resolves once cancellation was requested or every token was dropped.
pub(crate) async fn cancel_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
