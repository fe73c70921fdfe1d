//! CLI entry point: one labeling pass for the CI event that triggered it.
//!
//! Run `labeler --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use labeler::github::{parse_repo, DEFAULT_API_URL};
use labeler::matcher::CompiledRules;
use labeler::{
    ConfigSource, EventKind, EventPayload, GitHubClient, Labeler, RunOutcome, SignalCollector,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "labeler")]
#[command(about = "Apply and retract labels on issues and pull requests from declarative rules")]
#[command(version)]
struct Cli {
    /// Token used for GitHub API calls
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Path of the rule configuration file
    #[arg(long, env = "INPUT_CONFIG_PATH", default_value = ".github/labeler.yml")]
    config_path: String,

    /// Repository holding the configuration, in owner/repo format
    #[arg(long, env = "INPUT_CONFIG_REPO")]
    config_repo: Option<String>,

    /// Path of the JSON event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// Name of the triggering event (pull_request, issues, ...)
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Repository being labeled, in owner/repo format
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// GitHub API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Seconds to wait before mutating labels
    #[arg(long, default_value_t = 15)]
    settle_delay_secs: u64,

    /// File receiving step outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    match run(&cli).await {
        Ok(outcome) => {
            // Removals never decide the outcome, but the process stays up for them
            outcome.removals.wait().await;
            Ok(())
        }
        Err(e) => {
            error!("{e:#}");
            Err(e)
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let (owner, repo) = parse_repo(&cli.repository)?;
    let client = Arc::new(
        GitHubClient::new(cli.github_token.clone(), owner, repo)?
            .with_base_url(&cli.api_url)?,
    );

    let source = ConfigSource::resolve(
        &cli.config_path,
        cli.config_repo.as_deref(),
        &cli.repository,
    )?;
    let config = source
        .load(&client)
        .await
        .context("Failed to load labeler configuration")?;

    let kind = EventKind::from(cli.event_name.as_str());
    let event = EventPayload::from_path(kind, &cli.event_path)?;
    info!(
        "Labeling #{} on {} ({} rules, {} checks)",
        event.item.number,
        cli.repository,
        config.labels.len(),
        config.checks.len()
    );

    let rules = CompiledRules::compile(&config)?;
    let signals = SignalCollector::new(&*client)
        .collect(&event, &rules)
        .await
        .context("Failed to collect item signals")?;

    let outcome = Labeler::new(client)
        .with_settle_delay(Duration::from_secs(cli.settle_delay_secs))
        .run(&config, &rules, &event.item, &signals)
        .await?;

    let labels: Vec<&String> = outcome.final_labels.iter().collect();
    let json = serde_json::to_string(&labels)?;
    println!("{json}");

    if let Some(path) = &cli.output_file {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(file, "labels={json}")?;
    }

    Ok(outcome)
}
