//! Structured error types for the health engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("invalid window: {0}")]
  InvalidWindow(String),

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv: {0}")]
  Csv(#[from] csv::Error),

  #[error("fetch: {0}")]
  Fetch(#[from] reqwest::Error),

  #[error("fetch: {url}: HTTP {status}")]
  HttpStatus { url: String, status: u16 },
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn invalid_window(msg: impl Into<String>) -> Self {
    Self::InvalidWindow(msg.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_message_names_field() {
    let err = EngineError::validation("repo.name", "expected org/name");
    assert_eq!(err.to_string(), "validation: repo.name: expected org/name");
  }

  #[test]
  fn http_status_message() {
    let err = EngineError::HttpStatus {
      url: "https://data.gharchive.org/2019-08-01-0.json.gz".into(),
      status: 404,
    };
    assert!(err.to_string().ends_with("HTTP 404"));
  }
}
