use hyper::StatusCode;
use thiserror::Error;

/// Failure of the single outbound statistics read.
#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("invalid statistics endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("unable to build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("request failed: {0}")]
    Transport(#[from] hyper::Error),
    #[error("statistics endpoint answered {0}")]
    Status(StatusCode),
    #[error("unable to decode response body: {0}")]
    Decode(#[from] std::io::Error),
    #[error("malformed statistics payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { key, reason: reason.into() }
    }
}
