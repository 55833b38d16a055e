use common::RepoSource;
use serde_json::Value;

use crate::models::RawCommitRecord;
use crate::payloads::{CommitEntry, CommitPayload, ItemOutcome, SkipReason};

pub fn parse_item(value: Value) -> ItemOutcome {
    let payload: CommitPayload =
        serde_json::from_value(value).map_err(|err| SkipReason::Undecodable(err.to_string()))?;
    payload.into_entry()
}

/// `message_length` counts characters, not bytes.
pub fn normalize_commit(entry: &CommitEntry, repo: &RepoSource) -> RawCommitRecord {
    RawCommitRecord {
        repo: repo.name.clone(),
        developer: entry.author_name.clone(),
        timestamp: entry.author_date.clone(),
        message_length: entry.message.chars().count() as u64,
        commit_id: entry.sha.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commit_json(name: Option<&str>, date: Option<&str>) -> Value {
        json!({
            "sha": "a1b2c3",
            "commit": {
                "author": { "name": name, "date": date, "email": "ana@example.com" },
                "message": "Fix routing"
            }
        })
    }

    #[test]
    fn complete_item_becomes_entry() {
        let entry = parse_item(commit_json(Some("Ana"), Some("2024-03-04T10:15:00Z")))
            .expect("entry");
        assert_eq!(entry.author_name, "Ana");
        assert_eq!(entry.author_date, "2024-03-04T10:15:00Z");
        assert_eq!(entry.sha.as_deref(), Some("a1b2c3"));
    }

    #[test]
    fn null_author_fields_are_skipped() {
        assert_eq!(
            parse_item(commit_json(None, Some("2024-03-04T10:15:00Z"))),
            Err(SkipReason::MissingAuthorName)
        );
        assert_eq!(
            parse_item(commit_json(Some("Ana"), None)),
            Err(SkipReason::MissingAuthorDate)
        );
    }

    #[test]
    fn missing_nested_objects_are_skipped() {
        assert_eq!(
            parse_item(json!({ "sha": "x" })),
            Err(SkipReason::MissingAuthor)
        );
        assert_eq!(
            parse_item(json!({ "sha": "x", "commit": { "author": null, "message": "m" } })),
            Err(SkipReason::MissingAuthor)
        );
        assert_eq!(
            parse_item(json!({
                "commit": { "author": { "name": "Ana", "date": "2024-01-01T00:00:00Z" } }
            })),
            Err(SkipReason::MissingMessage)
        );
    }

    #[test]
    fn non_object_item_is_undecodable() {
        let outcome = parse_item(json!("not a commit"));
        assert!(matches!(outcome, Err(SkipReason::Undecodable(_))));
    }

    #[test]
    fn sha_is_optional() {
        let entry = parse_item(json!({
            "commit": {
                "author": { "name": "Ana", "date": "2024-01-01T00:00:00Z" },
                "message": "init"
            }
        }))
        .expect("entry");
        assert_eq!(entry.sha, None);
    }

    #[test]
    fn message_length_counts_characters() {
        let entry = CommitEntry {
            sha: Some("abc".into()),
            author_name: "Jos\u{e9}".into(),
            author_date: "2024-01-01T00:00:00Z".into(),
            message: "na\u{ef}ve caf\u{e9} \u{2728}".into(),
        };
        let record = normalize_commit(&entry, &RepoSource::new("pallets", "flask"));
        assert_eq!(record.message_length, 12);
        assert_eq!(record.repo, "flask");
        assert_eq!(record.developer, "Jos\u{e9}");
        assert_eq!(record.commit_id.as_deref(), Some("abc"));
    }
}
