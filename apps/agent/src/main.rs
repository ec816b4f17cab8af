mod analysis;
mod config;
mod documents;
mod errors;
mod generation;
mod llm_client;
mod models;
mod pipeline;
mod server;
mod state;
mod text;
mod tools;
mod vcs;

#[cfg(test)]
mod testing;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::pipeline::{AutoConfirmer, Confirmer, PipelineController, RunMode, TerminalConfirmer};
use crate::server::ToolServer;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
    name = "portfolio-agent",
    version,
    about = "Adds projects to a portfolio site and resume"
)]
struct Cli {
    /// Portfolio repository to update (overrides PORTFOLIO_PATH).
    #[arg(long, global = true)]
    portfolio: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the update pipeline for one project.
    Run {
        /// Project directory to analyze.
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = RunMode::Auto)]
        mode: RunMode,
        /// Replace the last resume slot without asking.
        #[arg(long)]
        yes: bool,
    },
    /// Serve tools over stdin/stdout (JSON-RPC, one message per line).
    Serve,
    /// Print the portfolio's current projects.
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration (fails on missing required env vars)
    let config = Config::from_env(cli.portfolio.clone())?;

    // Initialize structured logging; stdout is reserved for results
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting portfolio-agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Portfolio repository: {}", config.portfolio_path.display());

    let state = AppState::new(config)?;
    info!(
        "Model backend: {} at {}",
        state.llm.model(),
        state.config.ollama_url
    );

    match cli.command {
        Command::Run { path, mode, yes } => run_once(&state, &path, mode, yes).await,
        Command::Serve => {
            let server = ToolServer::new(state);
            server
                .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            let entries = PipelineController::new(&state, &AutoConfirmer).list_projects()?;
            for (n, entry) in entries.iter().enumerate() {
                println!("{:>2}. {} [{}]", n + 1, entry.title, entry.technologies.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One CLI run. The report goes to stdout as JSON; an aborted run exits
/// non-zero with the failed stage on stderr.
async fn run_once(state: &AppState, path: &Path, mode: RunMode, yes: bool) -> Result<ExitCode> {
    let confirmer: &dyn Confirmer = if yes { &AutoConfirmer } else { &TerminalConfirmer };
    let mut controller = PipelineController::new(state, confirmer);

    match controller.run(path, mode).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Run aborted: {e}");
            let trail: Vec<String> = controller
                .transitions()
                .iter()
                .map(|s| s.to_string())
                .collect();
            eprintln!("Aborted during {}: {} ({})", e.stage, e.source, e.source.kind());
            eprintln!("States: {}", trail.join(" → "));
            Ok(ExitCode::FAILURE)
        }
    }
}
