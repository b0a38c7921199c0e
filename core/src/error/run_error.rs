// core/src/error/run_error.rs
use thiserror::Error;

use crate::run::RunStatus;

/// Errors returned by the controller API itself. Run failures are not errors here;
/// they are published as the `failed` status with a message.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("brief text is empty")]
    EmptyBrief,

    #[error("no active run")]
    NoActiveRun,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("run driver task failed")]
    Driver(#[source] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal run transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: RunStatus,
    pub to: RunStatus,
}
