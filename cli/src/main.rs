use clap::Parser;
mod commands;
mod error;
use challenge_stream_core::config::{self, AppConfig, LoggingConfig};
use commands::cli;
use error::CliError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();
    let cfg = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load_default()?,
    };
    let guard = init_logging(&cfg.logging)?;

    let exit = dispatch(args.command, cfg).await?;
    // Flush the file appender; process::exit skips destructors.
    drop(guard);
    std::process::exit(exit);
}

async fn dispatch(cmd: cli::Commands, cfg: AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Generate(gen_args) => commands::generate::run(cfg, gen_args).await,
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr, and additionally to a
/// daily rolling file when a directory is configured.
fn init_logging(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let (file_layer, guard) = match &cfg.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &cfg.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;
    Ok(guard)
}
