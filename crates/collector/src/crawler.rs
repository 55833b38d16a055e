use common::RepoSource;
use normalizer::{normalize_commit, RawCommitRecord};
use tracing::{info, warn};

use crate::fetcher::{PageFailure, PageFetcher};

#[derive(Debug)]
pub enum CrawlOutcome {
    /// Upstream returned an empty page.
    Exhausted { page: u32 },
    /// `max_pages` were read without reaching the end of history.
    PageLimit,
    Failed { page: u32, failure: PageFailure },
}

impl CrawlOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlOutcome::Exhausted { .. } => "exhausted",
            CrawlOutcome::PageLimit => "page_limit",
            CrawlOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub repo: RepoSource,
    pub records: Vec<RawCommitRecord>,
    pub pages_fetched: u32,
    pub skipped: usize,
    pub outcome: CrawlOutcome,
}

pub struct RepoCrawler {
    fetcher: PageFetcher,
}

impl RepoCrawler {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Walks pages `1..=max_pages` in order. An empty page or a failed page
    /// stops this repository only; records gathered before a failure are kept.
    pub async fn crawl(&self, repo: &RepoSource, max_pages: u32, page_size: u32) -> CrawlReport {
        info!(repo = %repo, max_pages, page_size, "collecting repository");
        let mut records = Vec::new();
        let mut pages_fetched = 0u32;
        let mut skipped = 0usize;
        let mut outcome = CrawlOutcome::PageLimit;

        for page in 1..=max_pages {
            match self.fetcher.fetch(repo, page, page_size).await {
                Ok(commit_page) => {
                    pages_fetched += 1;
                    if commit_page.is_exhausted() {
                        outcome = CrawlOutcome::Exhausted { page };
                        break;
                    }
                    skipped += commit_page.skipped.len();
                    records.extend(
                        commit_page
                            .entries
                            .iter()
                            .map(|entry| normalize_commit(entry, repo)),
                    );
                    info!(
                        repo = %repo,
                        page,
                        collected = commit_page.entries.len(),
                        skipped = commit_page.skipped.len(),
                        "page collected"
                    );
                }
                Err(failure) => {
                    warn!(
                        repo = %repo,
                        page,
                        kind = failure.as_str(),
                        error = %failure,
                        "error fetching page, stopping repository"
                    );
                    outcome = CrawlOutcome::Failed { page, failure };
                    break;
                }
            }
        }

        CrawlReport {
            repo: repo.clone(),
            records,
            pages_fetched,
            skipped,
            outcome,
        }
    }
}
