use tokio::io::AsyncReadExt;

use challenge_stream_core::api::{
    AppConfig, GenerationSession, RunController, RunStatus, RunView, TransportConfig,
};
use challenge_stream_core::config::ReplayTransportConfig;
use challenge_stream_core::result::ResultSnapshot;
use challenge_stream_plugins::factory;

use super::cli::{GenerateArgs, OutputFormat};
use crate::error::CliError;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

pub async fn run(mut cfg: AppConfig, args: GenerateArgs) -> Result<i32, CliError> {
    apply_overrides(&mut cfg, &args);
    let brief = read_brief(&args).await?;

    let transport = factory::build_transport(&cfg).map_err(CliError::Plugin)?;
    let store = factory::build_settings_store(&cfg);
    let controller = RunController::new(transport, cfg.control.clone())
        .with_settings(store, cfg.settings.generator_config_key.clone());
    let mut session = GenerationSession::new(controller);

    session
        .start(&brief, args.include_research, args.research_ids.clone())
        .await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut progress = Progress::default();
    progress.show(&session.view());

    let view = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!(target: "challenge_stream.cli", "interrupt received, cancelling run");
                break session.cancel().await?;
            }
            next = session.changed() => match next {
                Some(view) => {
                    progress.show(&view);
                    if view.is_terminal() {
                        break session.wait().await?;
                    }
                }
                None => break session.wait().await?,
            }
        }
    };
    progress.show(&view);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => print!("{}", render_text(&view)),
    }
    Ok(exit_code(view.status))
}

fn apply_overrides(cfg: &mut AppConfig, args: &GenerateArgs) {
    if let Some(secs) = args.timeout_secs {
        cfg.control.timeout_secs = secs;
    }
    if let Some(ms) = args.pacing_ms {
        cfg.control.pacing_ms = ms;
    }
    if let Some(path) = &args.replay {
        cfg.transport = TransportConfig::Replay(ReplayTransportConfig {
            events_file: path.display().to_string(),
            chunk_bytes: match &cfg.transport {
                TransportConfig::Replay(r) => r.chunk_bytes,
                TransportConfig::Http(_) => 512,
            },
        });
    }
    if let (Some(url), TransportConfig::Http(http)) = (&args.base_url, &mut cfg.transport) {
        http.base_url = url.clone();
    }
}

async fn read_brief(args: &GenerateArgs) -> Result<String, CliError> {
    if let Some(brief) = &args.brief {
        return Ok(brief.clone());
    }
    if let Some(path) = &args.brief_file {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())));
    }
    if args.stdin {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .map_err(|e| CliError::Input(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }
    Err(CliError::Input(
        "one of --brief, --brief-file or --stdin is required".to_string(),
    ))
}

pub fn exit_code(status: RunStatus) -> i32 {
    match status {
        RunStatus::Succeeded => EXIT_OK,
        RunStatus::Cancelled => EXIT_CANCELLED,
        RunStatus::Idle | RunStatus::Running | RunStatus::Failed => EXIT_FAILED,
    }
}

/// Echoes new log lines and step changes to stderr.
#[derive(Default)]
struct Progress {
    run_id: Option<String>,
    logs_seen: usize,
    last_step: String,
}

impl Progress {
    fn show(&mut self, view: &RunView) {
        if view.run_id != self.run_id {
            self.run_id = view.run_id.clone();
            self.logs_seen = 0;
            self.last_step.clear();
        }
        for line in view.logs.iter().skip(self.logs_seen) {
            eprintln!("  {line}");
        }
        self.logs_seen = self.logs_seen.max(view.logs.len());

        let step = view.current_step.label();
        if !step.is_empty() && step != self.last_step {
            eprintln!("> {step}");
            self.last_step = step.to_string();
        }
    }
}

pub fn render_text(view: &RunView) -> String {
    let mut out = String::new();
    match view.status {
        RunStatus::Succeeded => render_result(&mut out, &view.result),
        RunStatus::Cancelled => out.push_str("Run cancelled.\n"),
        _ => {
            let msg = view.error.as_deref().unwrap_or("unknown error");
            out.push_str(&format!("Run failed: {msg}\n"));
        }
    }
    out
}

fn render_result(out: &mut String, result: &ResultSnapshot) {
    if !result.diagnostic_summary.is_empty() {
        out.push_str(&format!("Diagnosis: {}\n", result.diagnostic_summary));
        for step in &result.diagnostic_path {
            let answer = serde_json::to_value(step.answer)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            out.push_str(&format!("  - {} [{}]\n", step.question, answer));
        }
        out.push('\n');
    }
    for stmt in result.statements() {
        let format = stmt.display_format.as_deref().unwrap_or(&stmt.selected_format);
        out.push_str(&format!("#{} ({}) {}\n", stmt.position, format, stmt.text));
        if let Some(eval) = &stmt.evaluation {
            out.push_str(&format!(
                "    score {:.1} / weighted {:.1}, {:?}\n",
                eval.total_score, eval.weighted_score, eval.recommendation
            ));
        }
    }
}
