pub mod config;
pub mod errors;
pub mod logging;
pub mod repo;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::repo::RepoSource;
