use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::config::CollectorConfig;
use common::RepoSource;
use gh_client::{GithubClient, RateLimitPolicy};
use normalizer::RawCommitRecord;
use tracing::{error, info, instrument, warn};

use crate::checkpoint::CheckpointStore;
use crate::crawler::{CrawlOutcome, RepoCrawler};
use crate::fetcher::PageFetcher;
use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    pub repo: RepoSource,
    pub outcome: &'static str,
    pub records: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub records: Vec<RawCommitRecord>,
    pub restored: usize,
    pub repos: Vec<RepoSummary>,
    pub checkpoint_failures: usize,
}

pub struct Collector {
    config: CollectorConfig,
    crawler: RepoCrawler,
    checkpoint: Arc<dyn CheckpointStore>,
}

impl Collector {
    pub fn new(
        config: CollectorConfig,
        client: Arc<dyn GithubClient>,
        checkpoint: Arc<dyn CheckpointStore>,
    ) -> Self {
        let fetcher = PageFetcher::new(
            client,
            RateLimitPolicy::fixed(Duration::from_secs(config.rate_limit_pause_secs)),
            Duration::from_millis(config.page_delay_ms),
        );
        Self {
            config,
            crawler: RepoCrawler::new(fetcher),
            checkpoint,
        }
    }

    /// Collects every configured repository in order.
    ///
    /// With `resume`, the checkpoint is restored first and repositories that
    /// already have records in it are not crawled again. The full buffer is
    /// saved after each crawled repository, before the next one starts.
    ///
    /// Completion is read from the records alone: a repository that was
    /// attempted but contributed no rows leaves no trace in the checkpoint and
    /// is crawled again on restart. That re-crawl cannot duplicate rows.
    #[instrument(skip(self))]
    pub async fn collect(&self, resume: bool) -> CollectionReport {
        let mut records = if resume {
            self.checkpoint.restore().await
        } else {
            Vec::new()
        };
        let restored = records.len();
        let completed: HashSet<String> = records.iter().map(|r| r.repo.clone()).collect();

        metrics::SEED_REPOS.set(self.config.repos.len() as i64);
        info!(
            repos = self.config.repos.len(),
            restored,
            "starting collection"
        );

        let mut report = CollectionReport {
            restored,
            ..CollectionReport::default()
        };

        for repo in &self.config.repos {
            if completed.contains(&repo.name) {
                info!(repo = %repo, "already in checkpoint, skipping");
                metrics::REPOS_PROCESSED_TOTAL
                    .with_label_values(&["restored"])
                    .inc();
                report.repos.push(RepoSummary {
                    repo: repo.clone(),
                    outcome: "restored",
                    records: records.iter().filter(|r| r.repo == repo.name).count(),
                    skipped: 0,
                });
                continue;
            }

            let started = Instant::now();
            let crawl = self
                .crawler
                .crawl(repo, self.config.max_pages, self.config.page_size)
                .await;
            let outcome = crawl.outcome.as_str();
            metrics::REPOS_PROCESSED_TOTAL
                .with_label_values(&[outcome])
                .inc();
            metrics::REPO_DURATION
                .with_label_values(&[outcome])
                .observe(started.elapsed().as_secs_f64());
            metrics::COMMITS_COLLECTED_TOTAL
                .with_label_values(&[&repo.full_name()])
                .inc_by(crawl.records.len() as u64);

            if let CrawlOutcome::Failed { page, failure } = &crawl.outcome {
                warn!(
                    repo = %repo,
                    page,
                    error = %failure,
                    kept = crawl.records.len(),
                    "repository ended early"
                );
            }

            report.repos.push(RepoSummary {
                repo: repo.clone(),
                outcome,
                records: crawl.records.len(),
                skipped: crawl.skipped,
            });
            records.extend(crawl.records);
            info!(
                repo = %repo,
                pages = crawl.pages_fetched,
                skipped = crawl.skipped,
                total = records.len(),
                "repository finished"
            );

            match self.checkpoint.save(&records).await {
                Ok(()) => {
                    metrics::CHECKPOINT_SAVES_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                }
                Err(err) => {
                    report.checkpoint_failures += 1;
                    metrics::CHECKPOINT_SAVES_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    error!(
                        repo = %repo,
                        error = %err,
                        "failed to save checkpoint, continuing with in-memory records"
                    );
                }
            }
        }

        report.records = records;
        report
    }
}
