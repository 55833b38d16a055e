use serde::{Deserialize, Serialize};

/// One observed commit as stored in the checkpoint. Field order is the
/// checkpoint column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommitRecord {
    pub repo: String,
    pub developer: String,
    #[serde(rename = "date")]
    pub timestamp: String,
    pub message_length: u64,
    #[serde(default)]
    pub commit_id: Option<String>,
}
