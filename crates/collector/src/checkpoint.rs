use std::path::{Path, PathBuf};

use async_trait::async_trait;
use normalizer::RawCommitRecord;
use thiserror::Error;
use tracing::{info, warn};

use crate::metrics;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("checkpoint csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("checkpoint buffer error: {0}")]
    Buffer(String),
}

/// Durable snapshot of every record accumulated so far.
///
/// `save` overwrites the previous snapshot with the full buffer. `restore`
/// never fails: a missing or unreadable snapshot restores as empty.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn restore(&self) -> Vec<RawCommitRecord>;
    async fn save(&self, records: &[RawCommitRecord]) -> Result<(), CheckpointError>;
}

/// CSV snapshot with columns `repo, developer, date, message_length, commit_id`.
pub struct CsvCheckpointStore {
    path: PathBuf,
}

impl CsvCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encode(records: &[RawCommitRecord]) -> Result<Vec<u8>, CheckpointError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|err| CheckpointError::Buffer(err.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Vec<RawCommitRecord>, CheckpointError> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn load(&self) -> Result<Option<Vec<RawCommitRecord>>, CheckpointError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        Self::decode(&bytes).map(Some)
    }
}

#[async_trait]
impl CheckpointStore for CsvCheckpointStore {
    async fn restore(&self) -> Vec<RawCommitRecord> {
        match self.load().await {
            Ok(Some(records)) => {
                info!(
                    path = %self.path.display(),
                    records = records.len(),
                    "restored checkpoint"
                );
                metrics::CHECKPOINT_RESTORED_RECORDS.set(records.len() as i64);
                records
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no checkpoint found, starting fresh");
                Vec::new()
            }
            Err(err) => {
                metrics::CHECKPOINT_CORRUPT_TOTAL.inc();
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "checkpoint unreadable, starting fresh"
                );
                Vec::new()
            }
        }
    }

    async fn save(&self, records: &[RawCommitRecord]) -> Result<(), CheckpointError> {
        let bytes = Self::encode(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("csv.partial");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|err| self.io_error(err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| self.io_error(err))?;
        Ok(())
    }
}
