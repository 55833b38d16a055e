use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::repo::RepoSource;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .set_override_option("github.token", token)?
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "GithubConfig::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "GithubConfig::default_api_base")]
    pub api_base: String,
    #[serde(default = "GithubConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl GithubConfig {
    fn default_user_agent() -> String {
        "commit-risk-lab".to_string()
    }

    fn default_api_base() -> String {
        "https://api.github.com/".to_string()
    }

    const fn default_request_timeout_secs() -> u64 {
        30
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_agent: Self::default_user_agent(),
            api_base: Self::default_api_base(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "CollectorConfig::default_repos")]
    pub repos: Vec<RepoSource>,
    #[serde(default = "CollectorConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "CollectorConfig::default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "CollectorConfig::default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "CollectorConfig::default_rate_limit_pause_secs")]
    pub rate_limit_pause_secs: u64,
    #[serde(default = "CollectorConfig::default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
}

impl CollectorConfig {
    const fn default_page_size() -> u32 {
        100
    }

    const fn default_max_pages() -> u32 {
        30
    }

    const fn default_page_delay_ms() -> u64 {
        200
    }

    const fn default_rate_limit_pause_secs() -> u64 {
        60
    }

    fn default_checkpoint_path() -> PathBuf {
        PathBuf::from("data/checkpoint_commits.csv")
    }

    fn default_repos() -> Vec<RepoSource> {
        [
            ("pallets", "flask"),
            ("tiangolo", "fastapi"),
            ("django", "django"),
            ("numpy", "numpy"),
            ("pytorch", "pytorch"),
            ("tensorflow", "tensorflow"),
            ("scikit-learn", "scikit-learn"),
            ("keras-team", "keras"),
            ("microsoft", "vscode"),
            ("facebook", "react"),
            ("huggingface", "transformers"),
            ("langchain-ai", "langchain"),
        ]
        .into_iter()
        .map(|(owner, name)| RepoSource::new(owner, name))
        .collect()
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            repos: Self::default_repos(),
            page_size: Self::default_page_size(),
            max_pages: Self::default_max_pages(),
            page_delay_ms: Self::default_page_delay_ms(),
            rate_limit_pause_secs: Self::default_rate_limit_pause_secs(),
            checkpoint_path: Self::default_checkpoint_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "DatasetConfig::default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "DatasetConfig::default_required_columns")]
    pub required_columns: Vec<String>,
}

impl DatasetConfig {
    fn default_output_path() -> PathBuf {
        PathBuf::from("data/github_commits_large.csv")
    }

    fn default_required_columns() -> Vec<String> {
        [
            "message_length",
            "commit_hour",
            "day_of_week",
            "is_weekend",
            "hour_deviation",
            "risk_label",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            output_path: Self::default_output_path(),
            required_columns: Self::default_required_columns(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// File that receives a Prometheus text dump when the job finishes.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: LogFormat::default(),
            metrics_path: None,
        }
    }
}
