mod support;

use std::sync::Arc;
use std::time::Duration;

use collector::{CrawlOutcome, PageFetcher, RepoCrawler};
use common::RepoSource;
use gh_client::RateLimitPolicy;
use normalizer::RawCommitRecord;
use support::{commit, ScriptedClient};

fn crawler(client: &Arc<ScriptedClient>) -> RepoCrawler {
    RepoCrawler::new(PageFetcher::new(
        client.clone(),
        RateLimitPolicy::fixed(Duration::ZERO),
        Duration::ZERO,
    ))
}

#[tokio::test]
async fn stops_at_first_empty_page() {
    let client = Arc::new(ScriptedClient::new());
    client
        .page(
            "pallets/flask",
            vec![
                commit("a1", "Ana", "2024-01-01T10:00:00Z", "Fix"),
                commit("a2", "Bo", "2024-01-01T11:00:00Z", "Docs"),
            ],
        )
        .page(
            "pallets/flask",
            vec![commit("a3", "Ana", "2024-01-02T10:00:00Z", "Tests")],
        )
        .page("pallets/flask", vec![]);

    let report = crawler(&client)
        .crawl(&RepoSource::new("pallets", "flask"), 10, 100)
        .await;

    assert!(matches!(report.outcome, CrawlOutcome::Exhausted { page: 3 }));
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.records.len(), 3);
    assert_eq!(client.calls_for("pallets/flask"), vec![1, 2, 3]);
}

#[tokio::test]
async fn records_are_normalized_in_fetch_order() {
    let client = Arc::new(ScriptedClient::new());
    client.page(
        "pallets/flask",
        vec![
            commit("a1", "Ana", "2024-01-01T10:00:00Z", "Fix routing"),
            commit("a2", "Bo", "2024-01-01T11:00:00Z", "\u{e9}t\u{e9}"),
        ],
    );

    let report = crawler(&client)
        .crawl(&RepoSource::new("pallets", "flask"), 10, 100)
        .await;

    assert_eq!(
        report.records,
        vec![
            RawCommitRecord {
                repo: "flask".into(),
                developer: "Ana".into(),
                timestamp: "2024-01-01T10:00:00Z".into(),
                message_length: 11,
                commit_id: Some("a1".into()),
            },
            RawCommitRecord {
                repo: "flask".into(),
                developer: "Bo".into(),
                timestamp: "2024-01-01T11:00:00Z".into(),
                message_length: 3,
                commit_id: Some("a2".into()),
            },
        ]
    );
}

#[tokio::test]
async fn failed_page_keeps_earlier_records() {
    let client = Arc::new(ScriptedClient::new());
    client
        .page(
            "numpy/numpy",
            vec![commit("n1", "Cy", "2024-02-01T08:00:00Z", "Speedup")],
        )
        .status("numpy/numpy", 502);

    let report = crawler(&client)
        .crawl(&RepoSource::new("numpy", "numpy"), 10, 100)
        .await;

    match &report.outcome {
        CrawlOutcome::Failed { page, failure } => {
            assert_eq!(*page, 2);
            assert_eq!(failure.as_str(), "http_error");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(client.calls_for("numpy/numpy"), vec![1, 2]);
}

#[tokio::test]
async fn page_limit_bounds_requests() {
    let client = Arc::new(ScriptedClient::new());
    for page in 0..4 {
        client.page(
            "django/django",
            vec![commit(
                &format!("d{page}"),
                "Di",
                "2024-03-01T12:00:00Z",
                "Change",
            )],
        );
    }

    let report = crawler(&client)
        .crawl(&RepoSource::new("django", "django"), 2, 1)
        .await;

    assert!(matches!(report.outcome, CrawlOutcome::PageLimit));
    assert_eq!(report.records.len(), 2);
    assert_eq!(client.calls_for("django/django"), vec![1, 2]);
}

#[tokio::test]
async fn skipped_items_do_not_end_the_crawl() {
    let client = Arc::new(ScriptedClient::new());
    client
        .page("pallets/flask", vec![serde_json::json!({ "sha": "x" })])
        .page(
            "pallets/flask",
            vec![commit("a1", "Ana", "2024-01-01T10:00:00Z", "Fix")],
        );

    let report = crawler(&client)
        .crawl(&RepoSource::new("pallets", "flask"), 10, 100)
        .await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.records.len(), 1);
    assert!(matches!(report.outcome, CrawlOutcome::Exhausted { page: 3 }));
}
