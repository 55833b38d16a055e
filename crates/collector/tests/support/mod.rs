#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::config::CollectorConfig;
use common::RepoSource;
use gh_client::GithubClient;
use http::{Response, StatusCode};
use serde_json::{json, Value};

pub enum Scripted {
    Reply(StatusCode, Vec<u8>),
    TransportError,
}

/// Replays per-repository responses in order. Once a repository's script is
/// used up every further page is an empty listing.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, repo: &str, reply: Scripted) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn page(&self, repo: &str, items: Vec<Value>) -> &Self {
        self.push(repo, ok_page(items))
    }

    pub fn status(&self, repo: &str, status: u16) -> &Self {
        self.push(
            repo,
            Scripted::Reply(
                StatusCode::from_u16(status).unwrap(),
                br#"{"message":"scripted"}"#.to_vec(),
            ),
        )
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, repo: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == repo)
            .map(|(_, page)| page)
            .collect()
    }
}

#[async_trait]
impl GithubClient for ScriptedClient {
    async fn list_commits(
        &self,
        repo: &RepoSource,
        page: u32,
        _per_page: u32,
    ) -> Result<Response<Vec<u8>>> {
        let key = repo.full_name();
        self.calls.lock().unwrap().push((key.clone(), page));
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match next.unwrap_or_else(|| ok_page(Vec::new())) {
            Scripted::Reply(status, body) => Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(body)?),
            Scripted::TransportError => Err(anyhow!("connection reset by peer")),
        }
    }
}

pub fn ok_page(items: Vec<Value>) -> Scripted {
    Scripted::Reply(StatusCode::OK, Value::Array(items).to_string().into_bytes())
}

pub fn commit(sha: &str, author: &str, date: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "commit": {
            "author": { "name": author, "email": "dev@example.com", "date": date },
            "message": message
        }
    })
}

pub fn collector_config(repos: &[(&str, &str)], checkpoint_path: std::path::PathBuf) -> CollectorConfig {
    CollectorConfig {
        repos: repos
            .iter()
            .map(|(owner, name)| RepoSource::new(*owner, *name))
            .collect(),
        page_size: 100,
        max_pages: 5,
        page_delay_ms: 0,
        rate_limit_pause_secs: 0,
        checkpoint_path,
    }
}
