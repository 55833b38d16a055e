pub mod clean;
pub mod dataset;
pub mod features;
pub mod validate;

pub use clean::{dedupe_commits, DedupeReport};
pub use dataset::{write_dataset, DatasetError, DatasetSummary};
pub use features::{
    developer_baselines, engineer_features, DeveloperBaseline, EngineeredDataset,
    EngineeredRecord,
};
pub use validate::{validate, Columns, ValidationError};
