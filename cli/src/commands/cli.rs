use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config.toml. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Stream a generation run for one brief and print the result.
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, group = "input")]
    pub brief: Option<String>,

    #[arg(long, group = "input")]
    pub brief_file: Option<PathBuf>,

    #[arg(long, group = "input")]
    pub stdin: bool,

    #[arg(long, default_value_t = false)]
    pub include_research: bool,

    /// Research document to ground the run in. Can be specified multiple times;
    /// ignored without `--include-research`.
    #[arg(long = "research-id", action = clap::ArgAction::Append)]
    pub research_ids: Vec<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Delay before each generated statement is shown. 0 disables pacing.
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    #[arg(long)]
    pub base_url: Option<String>,

    /// Replay a recorded response body instead of calling the backend.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
