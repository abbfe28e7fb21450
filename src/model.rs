//! Story records as stored locally and exchanged with the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user-submitted story.
///
/// The same shape is persisted in the local record store, so a stored record
/// round-trips byte-for-byte through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
  /// Server-assigned id. Empty means "unkeyed" and is never stored.
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub photo_url: String,
  /// ISO 8601 timestamp as sent by the server
  #[serde(default)]
  pub created_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lat: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lon: Option<f64>,
}

impl StoryRecord {
  pub fn has_key(&self) -> bool {
    !self.id.is_empty()
  }

  /// Both coordinates, if the story carries a location.
  pub fn location(&self) -> Option<(f64, f64)> {
    self.lat.zip(self.lon)
  }

  /// Parsed creation time; `None` when the server sent something unexpected.
  pub fn created(&self) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&self.created_at)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_api_shape() {
    let json = r#"{
      "id": "story-FvU4u0Vp2S3PMsFg",
      "name": "Dimas",
      "description": "Lorem Ipsum",
      "photoUrl": "https://story-api.dicoding.dev/images/stories/photos-1641623658595_dummy-pic.png",
      "createdAt": "2022-01-08T06:34:18.598Z",
      "lat": -10.212,
      "lon": -16.002
    }"#;

    let story: StoryRecord = serde_json::from_str(json).unwrap();
    assert_eq!(story.id, "story-FvU4u0Vp2S3PMsFg");
    assert_eq!(story.location(), Some((-10.212, -16.002)));
    assert!(story.created().is_some());
  }

  #[test]
  fn missing_location_is_none_and_not_reserialized() {
    let json = r#"{"id":"s1","name":"A","description":"d","photoUrl":"p","createdAt":"x","lat":null}"#;
    let story: StoryRecord = serde_json::from_str(json).unwrap();
    assert_eq!(story.location(), None);
    assert!(story.created().is_none());

    let out = serde_json::to_string(&story).unwrap();
    assert!(!out.contains("lat"));
  }
}
