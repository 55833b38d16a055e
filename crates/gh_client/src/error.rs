use http::StatusCode;
use thiserror::Error;

/// A non-success, non-throttle answer from the commits endpoint.
#[derive(Debug, Error)]
#[error("upstream answered {status} for {endpoint}")]
pub struct HttpStatusError {
    pub status: StatusCode,
    pub endpoint: String,
}

impl HttpStatusError {
    pub fn new(status: StatusCode, endpoint: impl Into<String>) -> Self {
        Self {
            status,
            endpoint: endpoint.into(),
        }
    }
}
