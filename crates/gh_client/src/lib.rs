pub mod client;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod rate_limit;

pub use client::{GithubClient, RestGithubClient};
pub use error::HttpStatusError;
pub use exec::{HttpExec, ReqwestExecutor};
pub use rate_limit::{RateLimitDecision, RateLimitPolicy};
