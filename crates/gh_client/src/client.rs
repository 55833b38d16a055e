use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use common::config::GithubConfig;
use common::RepoSource;
use http::{header, Request, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::exec::HttpExec;
use crate::metrics;

/// Commit listing against the upstream API. Implementations return the raw
/// response whatever its status, so callers can apply throttling policy.
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn list_commits(
        &self,
        repo: &RepoSource,
        page: u32,
        per_page: u32,
    ) -> Result<Response<Vec<u8>>>;
}

pub struct RestGithubClient {
    exec: Arc<dyn HttpExec>,
    base: Url,
    user_agent: String,
    token: Option<String>,
}

impl RestGithubClient {
    pub fn new(exec: Arc<dyn HttpExec>, config: &GithubConfig) -> Result<Self> {
        let mut base = config.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            exec,
            base: Url::parse(&base)?,
            user_agent: config.user_agent.clone(),
            token: config.token.clone(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn commits_url(&self, repo: &RepoSource, page: u32, per_page: u32) -> Result<Url> {
        let path = format!("repos/{}/{}/commits", repo.owner, repo.name);
        let mut url = self.base.join(&path)?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    fn build_request(&self, url: &Url) -> Result<Request<Vec<u8>>> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header(header::USER_AGENT, self.user_agent.as_str())
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("token {token}"));
        }
        Ok(builder.body(Vec::new())?)
    }
}

#[async_trait]
impl GithubClient for RestGithubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn list_commits(
        &self,
        repo: &RepoSource,
        page: u32,
        per_page: u32,
    ) -> Result<Response<Vec<u8>>> {
        let url = self.commits_url(repo, page, per_page)?;
        let request = self.build_request(&url)?;
        debug!(url = %url, authenticated = self.is_authenticated(), "dispatching commits request");

        let started = Instant::now();
        let response = self.exec.execute(request).await?;
        metrics::HTTP_LATENCY_SECONDS
            .with_label_values(&["commits"])
            .observe(started.elapsed().as_secs_f64());
        metrics::HTTP_REQUESTS_TOTAL
            .with_label_values(&[metrics::status_class(response.status())])
            .inc();
        Ok(response)
    }
}
