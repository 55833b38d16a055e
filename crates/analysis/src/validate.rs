use normalizer::RawCommitRecord;
use thiserror::Error;

use crate::features::EngineeredRecord;

/// The field names a record carries. Optional fields only count when present.
pub trait Columns {
    fn columns(&self) -> Vec<&'static str>;
}

impl Columns for EngineeredRecord {
    fn columns(&self) -> Vec<&'static str> {
        EngineeredRecord::COLUMNS
            .iter()
            .copied()
            .filter(|column| *column != "commit_id" || self.commit_id.is_some())
            .collect()
    }
}

impl Columns for RawCommitRecord {
    fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["repo", "developer", "date", "message_length"];
        if self.commit_id.is_some() {
            columns.push("commit_id");
        }
        columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumn { columns: Vec<String> },
}

/// A required column fails when no record carries it, so an empty record set
/// fails for every required column. Never mutates `records`.
pub fn validate<R, S>(records: &[R], required: &[S]) -> Result<(), ValidationError>
where
    R: Columns,
    S: AsRef<str>,
{
    let mut missing: Vec<String> = Vec::new();
    for column in required.iter().map(AsRef::as_ref) {
        if missing.iter().any(|m| m == column) {
            continue;
        }
        let present = records
            .iter()
            .any(|record| record.columns().iter().any(|c| *c == column));
        if !present {
            missing.push(column.to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumn { columns: missing })
    }
}
