use std::collections::HashSet;

use normalizer::RawCommitRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeReport {
    pub kept: usize,
    pub duplicates: usize,
}

/// Drops records whose `commit_id` was already seen; the first occurrence
/// wins and order is preserved. Records without a `commit_id` are always kept.
pub fn dedupe_commits(records: Vec<RawCommitRecord>) -> (Vec<RawCommitRecord>, DedupeReport) {
    let mut seen = HashSet::new();
    let mut report = DedupeReport::default();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|record| match &record.commit_id {
            Some(id) if !seen.insert(id.clone()) => {
                report.duplicates += 1;
                false
            }
            _ => true,
        })
        .collect();
    report.kept = kept.len();
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(repo: &str, commit_id: Option<&str>) -> RawCommitRecord {
        RawCommitRecord {
            repo: repo.into(),
            developer: "Ana".into(),
            timestamp: "2024-01-01T10:00:00Z".into(),
            message_length: 5,
            commit_id: commit_id.map(str::to_string),
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let (kept, report) = dedupe_commits(vec![
            record("flask", Some("a")),
            record("flask-fork", Some("a")),
            record("flask", Some("b")),
        ]);
        assert_eq!(report, DedupeReport { kept: 2, duplicates: 1 });
        assert_eq!(kept[0].repo, "flask");
        assert_eq!(kept[1].commit_id.as_deref(), Some("b"));
    }

    #[test]
    fn records_without_ids_are_never_merged() {
        let (kept, report) = dedupe_commits(vec![record("flask", None), record("flask", None)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.duplicates, 0);
    }
}
