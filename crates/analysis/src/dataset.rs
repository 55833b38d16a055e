use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::features::EngineeredRecord;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer error: {0}")]
    Buffer(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub developers: usize,
    pub repos: usize,
    pub risky: usize,
}

impl DatasetSummary {
    pub fn from_records(records: &[EngineeredRecord]) -> Self {
        let developers: HashSet<&str> = records.iter().map(|r| r.developer.as_str()).collect();
        let repos: HashSet<&str> = records.iter().map(|r| r.repo.as_str()).collect();
        Self {
            rows: records.len(),
            developers: developers.len(),
            repos: repos.len(),
            risky: records.iter().filter(|r| r.is_risky()).count(),
        }
    }

    pub fn risk_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.risky as f64 / self.rows as f64
        }
    }
}

/// Writes the final artifact. The file is replaced in one rename so readers
/// never observe a half-written dataset.
pub fn write_dataset(path: &Path, records: &[EngineeredRecord]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| DatasetError::Buffer(err.to_string()))?;

    let io_err = |source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let staging = path.with_extension("csv.partial");
    fs::write(&staging, &bytes).map_err(io_err)?;
    fs::rename(&staging, path).map_err(io_err)?;
    debug!(path = %path.display(), rows = records.len(), "dataset written");
    Ok(())
}
