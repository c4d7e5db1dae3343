use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Invalid endpoint {0}")]
  Endpoint(String),

  #[error("Request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} returned {status}: {body}")]
  Status {
    url: String,
    status: StatusCode,
    body: String,
  },

  #[error("Invalid response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },
}

impl ApiError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
  }
}

pub type Result<T> = std::result::Result<T, ApiError>;
