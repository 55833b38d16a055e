use std::sync::Arc;
use std::time::Duration;

use common::RepoSource;
use gh_client::rate_limit::{parse_rate_limit, parse_retry_after};
use gh_client::{GithubClient, HttpStatusError, RateLimitDecision, RateLimitPolicy};
use http::{Response, StatusCode};
use normalizer::{parse_item, CommitEntry, SkipReason};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::metrics;

/// Why a page could not be read. Every variant ends the crawl of the current
/// repository only.
#[derive(Debug, Error)]
pub enum PageFailure {
    #[error("still failing after rate-limit retry (status {status:?})")]
    RateLimited { status: Option<StatusCode> },
    #[error(transparent)]
    HttpStatus(HttpStatusError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("undecodable page body: {0}")]
    Decode(String),
}

impl PageFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageFailure::RateLimited { .. } => "rate_limited",
            PageFailure::HttpStatus(_) => "http_error",
            PageFailure::Transport(_) => "transport",
            PageFailure::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPage {
    pub entries: Vec<CommitEntry>,
    pub skipped: Vec<SkippedItem>,
    /// Items upstream returned, including the skipped ones.
    pub upstream_len: usize,
}

impl CommitPage {
    /// Upstream has no more history. A page whose items were all skipped is
    /// not exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.upstream_len == 0
    }
}

pub type PageResult = Result<CommitPage, PageFailure>;

pub struct PageFetcher {
    client: Arc<dyn GithubClient>,
    policy: RateLimitPolicy,
    page_delay: Duration,
}

impl PageFetcher {
    pub fn new(client: Arc<dyn GithubClient>, policy: RateLimitPolicy, page_delay: Duration) -> Self {
        Self {
            client,
            policy,
            page_delay,
        }
    }

    /// Fetches one page. The fixed page delay follows every attempt, failed or not.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn fetch(&self, repo: &RepoSource, page: u32, page_size: u32) -> PageResult {
        let result = self.fetch_page(repo, page, page_size).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(failure) => failure.as_str(),
        };
        metrics::PAGES_FETCHED_TOTAL
            .with_label_values(&[outcome])
            .inc();
        sleep(self.page_delay).await;
        result
    }

    async fn fetch_page(&self, repo: &RepoSource, page: u32, page_size: u32) -> PageResult {
        let mut response = self
            .client
            .list_commits(repo, page, page_size)
            .await
            .map_err(|err| PageFailure::Transport(format!("{err:#}")))?;

        if let RateLimitDecision::Throttled { pause } = self.policy.assess(response.status()) {
            let headers = response.headers();
            let rate_limit = parse_rate_limit(headers);
            warn!(
                repo = %repo,
                page,
                status = %response.status(),
                pause_secs = pause.as_secs(),
                retry_after_secs = parse_retry_after(headers).map(|d| d.as_secs()),
                rate_limit_remaining = rate_limit.as_ref().map(|rl| rl.remaining),
                rate_limit_reset = rate_limit.as_ref().map(|rl| rl.reset.timestamp()),
                "throttled by upstream, pausing before a single retry"
            );
            self.policy.wait().await;
            response = self.retry_once(repo, page, page_size).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(PageFailure::HttpStatus(HttpStatusError::new(
                status,
                format!("repos/{}/commits?page={page}", repo.full_name()),
            )));
        }

        let items = decode_items(response.body())?;
        Ok(collect_entries(repo, page, items))
    }

    async fn retry_once(
        &self,
        repo: &RepoSource,
        page: u32,
        page_size: u32,
    ) -> Result<Response<Vec<u8>>, PageFailure> {
        match self.client.list_commits(repo, page, page_size).await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let status = response.status();
                // a repeated throttle is counted but never paused for
                self.policy.record_throttle(status);
                Err(PageFailure::RateLimited {
                    status: Some(status),
                })
            }
            Err(err) => {
                debug!(repo = %repo, page, error = %format!("{err:#}"), "retry transport failure");
                Err(PageFailure::RateLimited { status: None })
            }
        }
    }
}

fn decode_items(body: &[u8]) -> Result<Vec<Value>, PageFailure> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| PageFailure::Decode(err.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(PageFailure::Decode(format!(
            "expected array, got {}",
            json_kind(&other)
        ))),
    }
}

fn collect_entries(repo: &RepoSource, page: u32, items: Vec<Value>) -> CommitPage {
    let upstream_len = items.len();
    let mut entries = Vec::with_capacity(upstream_len);
    let mut skipped = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match parse_item(item) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                metrics::ITEMS_SKIPPED_TOTAL
                    .with_label_values(&[reason.as_str()])
                    .inc();
                warn!(
                    repo = %repo,
                    page,
                    item = index,
                    reason = %reason,
                    "skipping malformed commit"
                );
                skipped.push(SkippedItem { index, reason });
            }
        }
    }
    CommitPage {
        entries,
        skipped,
        upstream_len,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
