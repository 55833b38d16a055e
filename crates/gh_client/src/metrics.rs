use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter_vec, CounterVec,
    HistogramVec, IntCounterVec,
};

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gh_client_http_requests_total",
        "Upstream commit API requests grouped by status class",
        &["status_class"]
    )
    .expect("gh_client http requests total")
});

pub static HTTP_LATENCY_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gh_client_http_latency_seconds",
        "Latency of upstream commit API requests",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
    )
    .expect("gh_client http latency")
});

pub static THROTTLE_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gh_client_throttle_events_total",
        "Responses classified as throttled grouped by status",
        &["status"]
    )
    .expect("gh_client throttle events")
});

pub static SLEEP_SECONDS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gh_client_sleep_seconds_total",
        "Seconds spent pausing before retries grouped by reason",
        &["reason"]
    )
    .expect("gh_client sleep seconds")
});

pub fn status_class(status: http::StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
