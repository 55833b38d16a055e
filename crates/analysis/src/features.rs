use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use normalizer::RawCommitRecord;
use serde::{Deserialize, Serialize};

/// A commit with its timing features and risk label. Field order is the
/// dataset column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub repo: String,
    pub developer: String,
    #[serde(rename = "date")]
    pub timestamp: String,
    pub message_length: u64,
    pub commit_hour: u32,
    pub day_of_week: u32,
    pub is_weekend: u8,
    pub dev_mean_hour: f64,
    pub dev_std_hour: f64,
    pub hour_deviation: f64,
    pub risk_label: u8,
    #[serde(default)]
    pub commit_id: Option<String>,
}

impl EngineeredRecord {
    pub const COLUMNS: [&'static str; 12] = [
        "repo",
        "developer",
        "date",
        "message_length",
        "commit_hour",
        "day_of_week",
        "is_weekend",
        "dev_mean_hour",
        "dev_std_hour",
        "hour_deviation",
        "risk_label",
        "commit_id",
    ];

    pub fn is_risky(&self) -> bool {
        self.risk_label == 1
    }
}

/// Mean and sample standard deviation of one developer's commit hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeveloperBaseline {
    pub mean_hour: f64,
    pub std_hour: f64,
    pub commits: usize,
}

impl DeveloperBaseline {
    /// A single commit has a standard deviation of zero, not an undefined one.
    pub fn from_hours(hours: &[u32]) -> Self {
        let commits = hours.len();
        if commits == 0 {
            return Self {
                mean_hour: 0.0,
                std_hour: 0.0,
                commits,
            };
        }
        let n = commits as f64;
        let mean_hour = hours.iter().map(|&h| h as f64).sum::<f64>() / n;
        let std_hour = if commits < 2 {
            0.0
        } else {
            let squares: f64 = hours
                .iter()
                .map(|&h| {
                    let d = h as f64 - mean_hour;
                    d * d
                })
                .sum();
            (squares / (n - 1.0)).sqrt()
        };
        Self {
            mean_hour,
            std_hour,
            commits,
        }
    }

    pub fn deviation(&self, hour: u32) -> f64 {
        (hour as f64 - self.mean_hour).abs()
    }

    /// Zero spread means no anomaly can be detected, whatever the deviation.
    pub fn is_anomalous(&self, deviation: f64) -> bool {
        self.std_hour > 0.0 && deviation > self.std_hour
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedRecord {
    pub index: usize,
    pub repo: String,
    pub developer: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineeredDataset {
    pub records: Vec<EngineeredRecord>,
    pub discarded: Vec<DiscardedRecord>,
}

/// Accepts RFC 3339 as served upstream plus the naive and offset forms that
/// spreadsheet round-trips produce. The hour is taken in the timestamp's own
/// offset.
pub fn parse_commit_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn developer_baselines<'a, I>(observations: I) -> HashMap<String, DeveloperBaseline>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut hours: HashMap<&str, Vec<u32>> = HashMap::new();
    for (developer, hour) in observations {
        hours.entry(developer).or_default().push(hour);
    }
    hours
        .into_iter()
        .map(|(developer, hours)| (developer.to_string(), DeveloperBaseline::from_hours(&hours)))
        .collect()
}

/// Engineers the full record set in one pass.
///
/// Pure: the output depends only on `records`, so identical input always
/// yields identical output. Baselines are recomputed from scratch every call,
/// which means adding commits for a developer can change the labels of that
/// developer's earlier commits. Records whose timestamp does not parse are
/// returned in [`EngineeredDataset::discarded`] in input order.
pub fn engineer_features(records: &[RawCommitRecord]) -> EngineeredDataset {
    let mut parsed = Vec::with_capacity(records.len());
    let mut discarded = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match parse_commit_time(&record.timestamp) {
            Some(at) => parsed.push((record, at)),
            None => discarded.push(DiscardedRecord {
                index,
                repo: record.repo.clone(),
                developer: record.developer.clone(),
                timestamp: record.timestamp.clone(),
            }),
        }
    }

    let baselines = developer_baselines(
        parsed
            .iter()
            .map(|(record, at)| (record.developer.as_str(), at.hour())),
    );

    let records = parsed
        .into_iter()
        .filter_map(|(record, at)| {
            let baseline = baselines.get(&record.developer)?;
            let commit_hour = at.hour();
            let day_of_week = at.weekday().num_days_from_monday();
            let hour_deviation = baseline.deviation(commit_hour);
            Some(EngineeredRecord {
                repo: record.repo.clone(),
                developer: record.developer.clone(),
                timestamp: record.timestamp.clone(),
                message_length: record.message_length,
                commit_hour,
                day_of_week,
                is_weekend: u8::from(day_of_week >= 5),
                dev_mean_hour: baseline.mean_hour,
                dev_std_hour: baseline.std_hour,
                hour_deviation,
                risk_label: u8::from(baseline.is_anomalous(hour_deviation)),
                commit_id: record.commit_id.clone(),
            })
        })
        .collect();

    EngineeredDataset { records, discarded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(developer: &str, timestamp: &str) -> RawCommitRecord {
        RawCommitRecord {
            repo: "flask".into(),
            developer: developer.into(),
            timestamp: timestamp.into(),
            message_length: 20,
            commit_id: None,
        }
    }

    #[test]
    fn baseline_for_single_commit_has_zero_spread() {
        let baseline = DeveloperBaseline::from_hours(&[23]);
        assert_eq!(baseline.mean_hour, 23.0);
        assert_eq!(baseline.std_hour, 0.0);
        assert!(!baseline.is_anomalous(100.0));
    }

    #[test]
    fn baseline_uses_sample_deviation() {
        let baseline = DeveloperBaseline::from_hours(&[10, 10, 22]);
        assert_eq!(baseline.mean_hour, 14.0);
        assert!((baseline.std_hour - 48f64.sqrt()).abs() < 1e-12);
        assert_eq!(baseline.commits, 3);
    }

    #[test]
    fn parses_upstream_and_round_tripped_timestamps() {
        let z = parse_commit_time("2024-03-09T22:05:00Z").expect("rfc3339");
        assert_eq!((z.hour(), z.weekday().num_days_from_monday()), (22, 5));

        let offset = parse_commit_time("2024-03-09 22:05:00+00:00").expect("offset");
        assert_eq!(offset, z);

        let naive = parse_commit_time("2024-03-09T22:05:00").expect("naive");
        assert_eq!(naive, z);

        // wall clock in the author's offset
        let local = parse_commit_time("2024-03-09T22:05:00+02:00").expect("local");
        assert_eq!(local.hour(), 22);

        assert!(parse_commit_time("").is_none());
        assert!(parse_commit_time("yesterday").is_none());
    }

    #[test]
    fn weekend_flag_follows_monday_zero_convention() {
        let dataset = engineer_features(&[
            raw("Ana", "2024-03-04T09:00:00Z"), // Monday
            raw("Ana", "2024-03-09T09:00:00Z"), // Saturday
            raw("Ana", "2024-03-10T09:00:00Z"), // Sunday
        ]);
        let days: Vec<_> = dataset
            .records
            .iter()
            .map(|r| (r.day_of_week, r.is_weekend))
            .collect();
        assert_eq!(days, vec![(0, 0), (5, 1), (6, 1)]);
    }

    #[test]
    fn unparseable_timestamps_are_discarded_with_context() {
        let dataset = engineer_features(&[
            raw("Ana", "2024-03-04T09:00:00Z"),
            raw("Ana", "not-a-date"),
        ]);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(
            dataset.discarded,
            vec![DiscardedRecord {
                index: 1,
                repo: "flask".into(),
                developer: "Ana".into(),
                timestamp: "not-a-date".into(),
            }]
        );
    }
}
