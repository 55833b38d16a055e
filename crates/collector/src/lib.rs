pub mod checkpoint;
pub mod crawler;
pub mod fetcher;
pub mod metrics;
pub mod pipeline;
pub mod service;

pub use checkpoint::{CheckpointError, CheckpointStore, CsvCheckpointStore};
pub use crawler::{CrawlOutcome, CrawlReport, RepoCrawler};
pub use fetcher::{CommitPage, PageFailure, PageFetcher, PageResult, SkippedItem};
pub use pipeline::{build_dataset, BuildStats, PipelineReport, RunOptions};
pub use service::{CollectionReport, Collector, RepoSummary};
