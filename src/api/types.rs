//! Serde types matching the story API envelopes, plus the outcome structs
//! handed back to callers.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};
use crate::model::StoryRecord;

/// Every API response is wrapped in `{error, message, ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
  #[serde(default)]
  pub error: bool,
  #[serde(default)]
  pub message: String,
  pub list_story: Option<Vec<StoryRecord>>,
  pub story: Option<StoryRecord>,
  pub login_result: Option<ApiLoginResult>,
}

impl ApiEnvelope {
  /// Turn an `{error: true}` body into `Rejected`.
  pub fn into_result(self) -> Result<Self> {
    if self.error {
      Err(DataError::Rejected(self.message))
    } else {
      Ok(self)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLoginResult {
  pub user_id: String,
  pub name: String,
  pub token: String,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a story listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoriesOutcome {
  /// No credential was held; nothing was fetched
  pub needs_auth: bool,
  pub stories: Vec<StoryRecord>,
  /// Served from a local copy rather than a fresh network answer
  pub from_cache: bool,
  /// What went wrong on the way, if anything
  pub error: Option<DataError>,
}

impl StoriesOutcome {
  pub fn needs_auth() -> Self {
    Self {
      needs_auth: true,
      ..Self::default()
    }
  }

  pub fn network(stories: Vec<StoryRecord>) -> Self {
    Self {
      stories,
      ..Self::default()
    }
  }

  pub fn cached(stories: Vec<StoryRecord>, error: Option<DataError>) -> Self {
    Self {
      stories,
      from_cache: true,
      error,
      ..Self::default()
    }
  }

  pub fn failed(error: DataError) -> Self {
    Self {
      error: Some(error),
      ..Self::default()
    }
  }
}

/// Result of a single-story lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryOutcome {
  pub needs_auth: bool,
  pub story: Option<StoryRecord>,
  pub from_cache: bool,
  pub error: Option<DataError>,
}

impl StoryOutcome {
  pub fn needs_auth() -> Self {
    Self {
      needs_auth: true,
      ..Self::default()
    }
  }

  pub fn network(story: StoryRecord) -> Self {
    Self {
      story: Some(story),
      ..Self::default()
    }
  }

  pub fn cached(story: StoryRecord, error: Option<DataError>) -> Self {
    Self {
      story: Some(story),
      from_cache: true,
      error,
      ..Self::default()
    }
  }

  pub fn failed(error: DataError) -> Self {
    Self {
      error: Some(error),
      ..Self::default()
    }
  }
}

/// `{success, message}` for write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
  pub success: bool,
  pub message: String,
}

impl ActionOutcome {
  pub fn ok(message: impl Into<String>) -> Self {
    Self {
      success: true,
      message: message.into(),
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      message: message.into(),
    }
  }
}

impl From<DataError> for ActionOutcome {
  fn from(e: DataError) -> Self {
    Self::failed(e.to_string())
  }
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
  pub success: bool,
  pub message: String,
  pub user: Option<ApiLoginResult>,
}

/// A story to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
  pub description: String,
  pub photo: PhotoUpload,
  pub lat: Option<f64>,
  pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
  pub file_name: String,
  pub mime: String,
  pub bytes: Vec<u8>,
}
