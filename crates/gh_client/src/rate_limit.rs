use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{header, HeaderMap, StatusCode};
use tokio::time::sleep;

use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Proceed,
    Throttled { pause: Duration },
}

/// Fixed-pause throttling policy.
///
/// A throttled response earns exactly one pause of [`RateLimitPolicy::pause`]
/// before the caller's single retry. The policy never retries on its own and
/// never grows the pause, so a second throttle is the caller's failure to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pause: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_PAUSE)
    }
}

impl RateLimitPolicy {
    pub const DEFAULT_PAUSE: Duration = Duration::from_secs(60);

    pub fn fixed(pause: Duration) -> Self {
        Self { pause }
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// 403 is how the commits endpoint reports an exhausted primary limit,
    /// 429 is the secondary limit.
    pub fn is_throttle_status(status: StatusCode) -> bool {
        status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
    }

    pub fn assess(&self, status: StatusCode) -> RateLimitDecision {
        if self.record_throttle(status) {
            RateLimitDecision::Throttled { pause: self.pause }
        } else {
            RateLimitDecision::Proceed
        }
    }

    /// Counts a throttled status without granting a pause. Returns whether
    /// `status` was a throttle.
    pub fn record_throttle(&self, status: StatusCode) -> bool {
        let throttled = Self::is_throttle_status(status);
        if throttled {
            metrics::THROTTLE_EVENTS_TOTAL
                .with_label_values(&[status.as_str()])
                .inc();
        }
        throttled
    }

    /// Blocks the calling task for the fixed pause.
    pub async fn wait(&self) {
        metrics::SLEEP_SECONDS
            .with_label_values(&["rate_limited"])
            .inc_by(self.pause.as_secs_f64());
        sleep(self.pause).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit: i64,
    pub remaining: i64,
    pub reset: DateTime<Utc>,
}

pub fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitSnapshot> {
    let limit = header_i64(headers, "x-ratelimit-limit")?;
    let remaining = header_i64(headers, "x-ratelimit-remaining")?;
    let reset_ts = header_i64(headers, "x-ratelimit-reset")?;
    let reset = DateTime::from_timestamp(reset_ts, 0)?;
    Some(RateLimitSnapshot {
        limit,
        remaining,
        reset,
    })
}

/// Upstream's own wait hint. Logged next to the fixed pause, never obeyed.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(header::RETRY_AFTER)?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = httpdate::parse_http_date(value).ok()?;
    date.duration_since(std::time::SystemTime::now()).ok()
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn only_throttle_statuses_pause() {
        let policy = RateLimitPolicy::fixed(Duration::from_secs(10));
        assert_eq!(
            policy.assess(StatusCode::FORBIDDEN),
            RateLimitDecision::Throttled {
                pause: Duration::from_secs(10)
            }
        );
        assert_eq!(
            policy.assess(StatusCode::TOO_MANY_REQUESTS),
            RateLimitDecision::Throttled {
                pause: Duration::from_secs(10)
            }
        );
        assert_eq!(policy.assess(StatusCode::OK), RateLimitDecision::Proceed);
        assert_eq!(
            policy.assess(StatusCode::INTERNAL_SERVER_ERROR),
            RateLimitDecision::Proceed
        );
        assert_eq!(policy.assess(StatusCode::NOT_FOUND), RateLimitDecision::Proceed);
    }

    #[test]
    fn record_throttle_counts_only_throttle_statuses() {
        let policy = RateLimitPolicy::fixed(Duration::from_secs(10));
        let counter = metrics::THROTTLE_EVENTS_TOTAL.with_label_values(&["429"]);
        let before = counter.get();

        assert!(policy.record_throttle(StatusCode::TOO_MANY_REQUESTS));
        assert!(!policy.record_throttle(StatusCode::OK));
        assert!(!policy.record_throttle(StatusCode::BAD_GATEWAY));

        // other tests share the registry, so only a lower bound holds
        assert!(counter.get() >= before + 1);
    }

    #[test]
    fn default_pause_is_one_minute() {
        assert_eq!(RateLimitPolicy::default().pause(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_the_fixed_pause() {
        let policy = RateLimitPolicy::fixed(Duration::from_secs(10));
        let started = tokio::time::Instant::now();
        policy.wait().await;
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[test]
    fn parses_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        let snapshot = parse_rate_limit(&headers).expect("snapshot");
        assert_eq!(snapshot.limit, 60);
        assert_eq!(snapshot.remaining, 0);
        assert_eq!(snapshot.reset.timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_headers_yield_none() {
        let headers = HeaderMap::new();
        assert!(parse_rate_limit(&headers).is_none());
        assert!(parse_retry_after(&headers).is_none());
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }
}
