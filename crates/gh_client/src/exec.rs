use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use http::{Request, Response};

/// Transport seam. Production uses [`ReqwestExecutor`]; tests script responses.
#[async_trait]
pub trait HttpExec: Send + Sync {
    async fn execute(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>>;
}

pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpExec for ReqwestExecutor {
    async fn execute(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let request = reqwest::Request::try_from(req)?;
        let upstream = self.client.execute(request).await?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            headers.extend(
                upstream
                    .headers()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        let body = upstream.bytes().await?;
        Ok(response.body(body.to_vec())?)
    }
}
