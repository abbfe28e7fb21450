//! Error taxonomy for the data-availability layer.
//!
//! Every failure inside the layer is one of these variants. They are caught at
//! the client boundary and folded into outcome structs, so presentation code
//! only ever sees them as an annotation.

use thiserror::Error;

pub type Result<T, E = DataError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
  /// No credential is held for a call that needs one.
  #[error("authentication required")]
  AuthRequired,
  /// The fetch failed at the transport level or the device is offline.
  #[error("network unavailable: {0}")]
  NetworkUnavailable(String),
  /// The local persistence engine failed (quota, engine missing, ...).
  #[error("local storage unavailable: {0}")]
  StorageUnavailable(String),
  /// A 2xx payload that could not be decoded.
  #[error("malformed response: {0}")]
  MalformedResponse(String),
  /// A well-formed `{error: true, message}` body from the API.
  #[error("{0}")]
  Rejected(String),
  /// A bulk upsert contained a record without an id.
  #[error("record at position {position} has no id")]
  MissingKey { position: usize },
}

impl DataError {
  /// Whether this failure should send the caller to a cached copy.
  pub fn is_network_class(&self) -> bool {
    matches!(
      self,
      Self::NetworkUnavailable(_) | Self::MalformedResponse(_) | Self::Rejected(_)
    )
  }
}

impl From<rusqlite::Error> for DataError {
  fn from(e: rusqlite::Error) -> Self {
    Self::StorageUnavailable(e.to_string())
  }
}

impl From<serde_json::Error> for DataError {
  fn from(e: serde_json::Error) -> Self {
    Self::MalformedResponse(e.to_string())
  }
}

impl From<reqwest::Error> for DataError {
  fn from(e: reqwest::Error) -> Self {
    Self::NetworkUnavailable(e.to_string())
  }
}
