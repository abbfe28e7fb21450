//! Push-notification subscription management and push payload decoding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::types::ActionOutcome;
use crate::api::StoryClient;
use crate::http::{Request, RequestBody};
use crate::session::Credential;

const DEFAULT_TITLE: &str = "Dicoding Stories";
const DEFAULT_BODY: &str = "There is a new update from Dicoding Stories";
const DEFAULT_ICON: &str = "/icons/icon-192x192.png";

/// Keys of a push subscription, already base64url-encoded by the push service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
  pub p256dh: String,
  pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
  pub endpoint: String,
  pub keys: PushKeys,
}

impl StoryClient {
  /// Register a push subscription with the API.
  pub async fn subscribe(
    &self,
    credential: Option<&Credential>,
    subscription: &PushSubscription,
  ) -> ActionOutcome {
    let Some(credential) = credential else {
      return ActionOutcome::failed("You need to be logged in to subscribe to notifications.");
    };

    let body = match serde_json::to_value(subscription) {
      Ok(body) => body,
      Err(e) => return ActionOutcome::failed(e.to_string()),
    };

    debug!(endpoint = %subscription.endpoint, "subscribing to push notifications");
    let request = Request::post(
      self.endpoint(&["notifications", "subscribe"]),
      RequestBody::Json(body),
    )
    .bearer(credential.token());

    self.submit(request).await
  }

  /// Remove a push subscription from the API.
  pub async fn unsubscribe(&self, credential: Option<&Credential>, endpoint: &str) -> ActionOutcome {
    let Some(credential) = credential else {
      return ActionOutcome::failed("You need to be logged in to unsubscribe from notifications.");
    };

    debug!(endpoint, "unsubscribing from push notifications");
    let request = Request::delete(
      self.endpoint(&["notifications", "subscribe"]),
      RequestBody::Json(serde_json::json!({ "endpoint": endpoint })),
    )
    .bearer(credential.token());

    self.submit(request).await
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
  #[serde(default)]
  pub body: String,
  pub icon: Option<String>,
  pub badge: Option<String>,
}

impl Default for NotificationOptions {
  fn default() -> Self {
    Self {
      body: DEFAULT_BODY.to_string(),
      icon: Some(DEFAULT_ICON.to_string()),
      badge: Some(DEFAULT_ICON.to_string()),
    }
  }
}

/// A notification to display for an incoming push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
  pub title: String,
  pub options: NotificationOptions,
}

#[derive(Deserialize)]
struct RawPush {
  title: Option<String>,
  options: Option<NotificationOptions>,
}

impl PushMessage {
  /// Decode a push payload `{title, options}`. Missing or non-JSON payloads
  /// fall back to the default notification, field by field.
  pub fn parse(payload: Option<&[u8]>) -> Self {
    let raw = payload
      .and_then(|bytes| serde_json::from_slice::<RawPush>(bytes).ok())
      .unwrap_or(RawPush {
        title: None,
        options: None,
      });

    Self {
      title: raw
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
      options: raw.options.unwrap_or_default(),
    }
  }
}
