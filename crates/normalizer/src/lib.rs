pub mod models;
pub mod payloads;
pub mod transform;

pub use models::RawCommitRecord;
pub use payloads::{CommitEntry, CommitPayload, ItemOutcome, SkipReason};
pub use transform::{normalize_commit, parse_item};
