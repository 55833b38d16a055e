use serde::Deserialize;
use thiserror::Error;

/// One element of the upstream commits listing. Every field is optional so
/// that a single malformed element can be skipped instead of failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitPayload {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub commit: Option<CommitDetailsPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitDetailsPayload {
    #[serde(default)]
    pub author: Option<AuthorPayload>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// An upstream element that carries everything a record needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub sha: Option<String>,
    pub author_name: String,
    pub author_date: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("item is not a commit object: {0}")]
    Undecodable(String),
    #[error("commit author missing")]
    MissingAuthor,
    #[error("commit author name missing")]
    MissingAuthorName,
    #[error("commit author date missing")]
    MissingAuthorDate,
    #[error("commit message missing")]
    MissingMessage,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Undecodable(_) => "undecodable",
            SkipReason::MissingAuthor => "missing_author",
            SkipReason::MissingAuthorName => "missing_author_name",
            SkipReason::MissingAuthorDate => "missing_author_date",
            SkipReason::MissingMessage => "missing_message",
        }
    }
}

pub type ItemOutcome = Result<CommitEntry, SkipReason>;

impl CommitPayload {
    pub fn into_entry(self) -> ItemOutcome {
        let details = self.commit.ok_or(SkipReason::MissingAuthor)?;
        let author = details.author.ok_or(SkipReason::MissingAuthor)?;
        let author_name = author.name.ok_or(SkipReason::MissingAuthorName)?;
        let author_date = author.date.ok_or(SkipReason::MissingAuthorDate)?;
        let message = details.message.ok_or(SkipReason::MissingMessage)?;
        Ok(CommitEntry {
            sha: self.sha,
            author_name,
            author_date,
            message,
        })
    }
}
