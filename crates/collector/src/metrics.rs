use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

pub static SEED_REPOS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "collector_seed_repositories",
        "Number of repositories configured for the current job"
    )
    .expect("collector seed repositories gauge")
});

pub static REPOS_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_repositories_processed_total",
        "Repositories handled by the collector grouped by outcome",
        &["outcome"]
    )
    .expect("collector repositories processed")
});

pub static REPO_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "collector_repository_duration_seconds",
        "Duration spent crawling a repository grouped by outcome",
        &["outcome"],
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]
    )
    .expect("collector repository duration histogram")
});

pub static PAGES_FETCHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_pages_fetched_total",
        "Commit pages requested grouped by outcome",
        &["outcome"]
    )
    .expect("collector pages fetched")
});

pub static ITEMS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_items_skipped_total",
        "Upstream commit items skipped grouped by reason",
        &["reason"]
    )
    .expect("collector items skipped")
});

pub static COMMITS_COLLECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_commits_collected_total",
        "Commit records collected per repository",
        &["repo"]
    )
    .expect("collector commits collected")
});

pub static CHECKPOINT_SAVES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_checkpoint_saves_total",
        "Checkpoint writes grouped by outcome",
        &["outcome"]
    )
    .expect("collector checkpoint saves")
});

pub static CHECKPOINT_RESTORED_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "collector_checkpoint_restored_records",
        "Records restored from the checkpoint at job start"
    )
    .expect("collector checkpoint restored records")
});

pub static CHECKPOINT_CORRUPT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "collector_checkpoint_corrupt_total",
        "Checkpoints that could not be read and were treated as empty"
    )
    .expect("collector checkpoint corrupt")
});

pub static RECORDS_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "collector_records_dropped_total",
        "Records dropped while building the dataset grouped by reason",
        &["reason"]
    )
    .expect("collector records dropped")
});

pub static DATASET_ROWS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "collector_dataset_rows",
        "Rows in the most recently written dataset"
    )
    .expect("collector dataset rows")
});

pub static DATASET_RISKY_ROWS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "collector_dataset_risky_rows",
        "Rows labeled risky in the most recently written dataset"
    )
    .expect("collector dataset risky rows")
});

/// Dumps the default registry in text exposition format.
pub fn write_text_dump(path: &Path) -> anyhow::Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, buffer)?;
    Ok(())
}
