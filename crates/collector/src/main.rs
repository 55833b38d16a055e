use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use collector::pipeline::{self, RunOptions};
use collector::{CheckpointStore, CsvCheckpointStore};
use common::{config::AppConfig, logging};
use gh_client::{GithubClient, HttpExec, ReqwestExecutor, RestGithubClient};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "collector",
    about = "Collect commit history and build the commit risk dataset"
)]
struct Cli {
    /// Directory containing `config/default.toml` and `config/local.toml`.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Ignore the existing checkpoint and collect every repository again.
    #[arg(long)]
    fresh: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_path(&cli.config_dir)?;
    logging::init_logging(
        &config.observability.log_level,
        config.observability.log_format,
    );

    let exec: Arc<dyn HttpExec> = Arc::new(ReqwestExecutor::new(
        &config.github.user_agent,
        Duration::from_secs(config.github.request_timeout_secs),
    )?);
    let client = RestGithubClient::new(exec, &config.github)?;
    if !client.is_authenticated() {
        warn!("GITHUB_TOKEN not set, using the unauthenticated rate limit");
    }
    let client: Arc<dyn GithubClient> = Arc::new(client);
    let checkpoint: Arc<dyn CheckpointStore> =
        Arc::new(CsvCheckpointStore::new(&config.collector.checkpoint_path));

    info!(
        repos = config.collector.repos.len(),
        max_pages = config.collector.max_pages,
        checkpoint = %config.collector.checkpoint_path.display(),
        output = %config.dataset.output_path.display(),
        "collector started"
    );

    let report = pipeline::run(&config, client, checkpoint, RunOptions { fresh: cli.fresh }).await?;
    info!(
        collected = report.collected,
        restored = report.restored,
        duplicates = report.build.duplicates,
        unparseable = report.build.unparseable,
        rows = report.summary.rows,
        risky = report.summary.risky,
        "job finished"
    );
    Ok(())
}
