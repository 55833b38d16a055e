use std::sync::Arc;

use analysis::{
    dedupe_commits, engineer_features, validate, write_dataset, DatasetSummary, EngineeredRecord,
    ValidationError,
};
use common::{AppConfig, AppError};
use gh_client::GithubClient;
use normalizer::RawCommitRecord;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::metrics;
use crate::service::Collector;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Ignore any existing checkpoint and collect every repository again.
    pub fresh: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub input: usize,
    pub duplicates: usize,
    pub unparseable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub restored: usize,
    pub collected: usize,
    pub build: BuildStats,
    pub summary: DatasetSummary,
}

/// Dedupes, engineers and validates. A missing required column is the one
/// fatal outcome of the whole job.
pub fn build_dataset<S: AsRef<str>>(
    records: Vec<RawCommitRecord>,
    required_columns: &[S],
) -> Result<(Vec<EngineeredRecord>, BuildStats), AppError> {
    let input = records.len();
    let (records, dedupe) = dedupe_commits(records);
    if dedupe.duplicates > 0 {
        info!(duplicates = dedupe.duplicates, "dropped duplicate commits");
        metrics::RECORDS_DROPPED_TOTAL
            .with_label_values(&["duplicate_commit"])
            .inc_by(dedupe.duplicates as u64);
    }

    let engineered = engineer_features(&records);
    for discarded in &engineered.discarded {
        warn!(
            repo = %discarded.repo,
            developer = %discarded.developer,
            timestamp = %discarded.timestamp,
            index = discarded.index,
            "discarding commit with unparseable timestamp"
        );
    }
    metrics::RECORDS_DROPPED_TOTAL
        .with_label_values(&["unparseable_timestamp"])
        .inc_by(engineered.discarded.len() as u64);

    validate(&engineered.records, required_columns).map_err(|err| match err {
        ValidationError::MissingColumn { columns } => AppError::MissingColumn { columns },
    })?;

    let stats = BuildStats {
        input,
        duplicates: dedupe.duplicates,
        unparseable: engineered.discarded.len(),
    };
    Ok((engineered.records, stats))
}

pub async fn run(
    config: &AppConfig,
    client: Arc<dyn GithubClient>,
    checkpoint: Arc<dyn CheckpointStore>,
    options: RunOptions,
) -> Result<PipelineReport, AppError> {
    if options.fresh {
        info!("fresh run requested, ignoring existing checkpoint");
    }
    let collector = Collector::new(config.collector.clone(), client, checkpoint);
    let collection = collector.collect(!options.fresh).await;
    let restored = collection.restored;
    let collected = collection.records.len();
    info!(
        collected,
        restored,
        checkpoint_failures = collection.checkpoint_failures,
        "collection complete"
    );

    info!("engineering features");
    let (records, build) = build_dataset(collection.records, &config.dataset.required_columns)?;

    let path = &config.dataset.output_path;
    write_dataset(path, &records).map_err(AppError::dataset)?;

    let summary = DatasetSummary::from_records(&records);
    metrics::DATASET_ROWS.set(summary.rows as i64);
    metrics::DATASET_RISKY_ROWS.set(summary.risky as i64);
    info!(
        path = %path.display(),
        rows = summary.rows,
        developers = summary.developers,
        repos = summary.repos,
        risky = summary.risky,
        risk_rate = summary.risk_rate(),
        "dataset written"
    );

    if let Some(metrics_path) = &config.observability.metrics_path {
        if let Err(err) = metrics::write_text_dump(metrics_path) {
            warn!(path = %metrics_path.display(), error = %err, "failed to write metrics dump");
        }
    }

    Ok(PipelineReport {
        restored,
        collected,
        build,
        summary,
    })
}
