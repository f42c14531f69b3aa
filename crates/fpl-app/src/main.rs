// fpl-squad entry point.
//
// Startup sequence:
// 1. Parse command line
// 2. Initialize tracing (log to file; stdout carries only the report)
// 3. Load config (copying defaults on first run), apply CLI overrides
// 4. Load candidates, rank and select
// 5. Print the reports

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use fpl_app::cli::Cli;
use fpl_app::config;
use fpl_app::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse command line
    let cli = Cli::parse();

    // 2. Initialize tracing
    let log_path = init_tracing()?;
    info!("fpl-squad starting up; logging to {}", log_path.display());

    // 3. Load config
    let base_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let mut config = config::load_config(&base_dir).context("failed to load configuration")?;
    cli.apply(&mut config);
    config::validate(&config).context("invalid command line override")?;
    info!(
        "Config loaded: budget {:.1}, {} players ({} starting), top {}",
        config.budget,
        config.policy.total_squad_size(),
        config.policy.starting_size(),
        config.ranking.top_n
    );

    // 4. Rank and select
    let output = run::run(&config, cli.plan()).await?;

    // 5. Print
    let rendered = run::render(&output, config.output.format)?;
    print!("{rendered}");

    info!("fpl-squad finished");
    Ok(())
}

/// `RUST_LOG` fallback: this workspace's crates at info, everything else at
/// warn.
const DEFAULT_LOG_FILTER: &str = "fpl_app=info,fpl_core=info,warn";

/// Send tracing output to `logs/fpl-squad.log` under the working directory.
/// Stdout is reserved for the rendered report, which may be JSON piped into
/// another tool. Returns the log file path.
fn init_tracing() -> anyhow::Result<PathBuf> {
    use tracing_subscriber::EnvFilter;

    let log_path = std::env::current_dir()
        .context("failed to resolve current directory")?
        .join("logs")
        .join("fpl-squad.log");
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(log_path)
}
