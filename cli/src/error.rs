use thiserror::Error;

use challenge_stream_core::error::{ConfigError, RunError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("input error: {0}")]
    Input(String),

    #[error("run error: {0}")]
    Run(#[from] RunError),

    #[error("plugin error: {0}")]
    Plugin(#[source] anyhow::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
