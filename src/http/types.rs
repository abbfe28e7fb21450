//! Transport-neutral request and response values.
//!
//! These are what the policy router reasons about and what the response cache
//! persists. Only `HttpFetcher` knows about reqwest.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
  Delete,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Delete => "DELETE",
    }
  }
}

/// How the request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
  /// A full-page navigation; gets the offline page when the network is gone.
  Navigate,
  /// Anything else (scripts, images, API calls).
  #[default]
  Subresource,
}

/// One field of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
  Text {
    name: String,
    value: String,
  },
  File {
    name: String,
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
  Json(serde_json::Value),
  Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub mode: RequestMode,
  pub headers: Vec<(String, String)>,
  pub body: Option<RequestBody>,
}

impl Request {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
      mode: RequestMode::Subresource,
      headers: Vec::new(),
      body: None,
    }
  }

  pub fn post(url: Url, body: RequestBody) -> Self {
    Self {
      method: Method::Post,
      body: Some(body),
      ..Self::get(url)
    }
  }

  pub fn delete(url: Url, body: RequestBody) -> Self {
    Self {
      method: Method::Delete,
      body: Some(body),
      ..Self::get(url)
    }
  }

  /// Mark this request as a full-page navigation.
  pub fn navigate(mut self) -> Self {
    self.mode = RequestMode::Navigate;
    self
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn bearer(self, token: &str) -> Self {
    self.with_header("Authorization", format!("Bearer {}", token))
  }

  /// Identity used by the response cache: method plus absolute URL, fragment excluded.
  pub fn cache_identity(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    format!("{} {}", self.method.as_str(), url)
  }
}

/// Where a response came from, relative to the app's own origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
  /// Same-origin
  Basic,
  /// Cross-origin, readable
  Cors,
  /// Cross-origin, unreadable
  Opaque,
}

impl ResponseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Basic => "basic",
      Self::Cors => "cors",
      Self::Opaque => "opaque",
    }
  }

  pub fn parse(s: &str) -> Self {
    match s {
      "basic" => Self::Basic,
      "cors" => Self::Cors,
      _ => Self::Opaque,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  pub kind: ResponseKind,
  pub redirected: bool,
}

impl Response {
  pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      content_type: Some(content_type.to_string()),
      body: body.into(),
      kind: ResponseKind::Basic,
      redirected: false,
    }
  }

  pub fn json(status: u16, value: &serde_json::Value) -> Self {
    Self::new(status, "application/json", value.to_string())
  }

  /// Placeholder returned for API requests when neither network nor cache can answer.
  pub fn network_error_json() -> Self {
    Self::json(
      503,
      &serde_json::json!({ "error": true, "message": "Network error" }),
    )
  }

  /// Placeholder returned for static assets when the network is gone.
  pub fn network_error_text() -> Self {
    Self::new(408, "text/plain", "Network error happened")
  }

  /// Any 2xx status.
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Exactly 200, same-origin and not redirected: safe to reuse from the shell cache.
  pub fn is_reusable(&self) -> bool {
    self.status == 200 && self.kind == ResponseKind::Basic && !self.redirected
  }

  /// Content type is `application/json` or a `+json` suffix type.
  pub fn is_json(&self) -> bool {
    let Some(content_type) = self.content_type.as_deref() else {
      return false;
    };
    let essence = content_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
  }

  pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
    serde_json::from_slice(&self.body).map_err(|e| DataError::MalformedResponse(e.to_string()))
  }

  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cache_identity_ignores_headers() {
    let url = Url::parse("https://story-api.dicoding.dev/v1/stories?page=1").unwrap();
    let plain = Request::get(url.clone());
    let authed = Request::get(url).bearer("abc");

    assert_eq!(plain.cache_identity(), authed.cache_identity());
    assert_eq!(
      plain.cache_identity(),
      "GET https://story-api.dicoding.dev/v1/stories?page=1"
    );
  }

  #[test]
  fn cache_identity_drops_fragment() {
    let root = Request::get(Url::parse("https://app.test/").unwrap());
    let routed = Request::get(Url::parse("https://app.test/#/detail/s1").unwrap());
    assert_eq!(root.cache_identity(), routed.cache_identity());
  }

  #[test]
  fn only_plain_same_origin_200_is_reusable() {
    let ok = Response::new(200, "text/html", "<html>");
    assert!(ok.is_reusable());

    let partial = Response::new(206, "text/html", "<ht");
    assert!(partial.is_ok());
    assert!(!partial.is_reusable());

    let redirected = Response {
      redirected: true,
      ..ok.clone()
    };
    assert!(!redirected.is_reusable());

    let opaque = Response {
      kind: ResponseKind::Opaque,
      ..ok
    };
    assert!(!opaque.is_reusable());
  }

  #[test]
  fn json_detection_uses_mime_essence() {
    assert!(Response::new(200, "application/json; charset=utf-8", "{}").is_json());
    assert!(Response::new(200, "application/problem+json", "{}").is_json());
    assert!(!Response::new(200, "image/jpeg", vec![0xff, 0xd8]).is_json());
    assert!(!Response {
      content_type: None,
      ..Response::new(200, "application/json", "{}")
    }
    .is_json());
  }

  #[test]
  fn synthesized_errors_are_not_ok() {
    let api = Response::network_error_json();
    assert_eq!(api.status, 503);
    let body: serde_json::Value = api.decode().unwrap();
    assert_eq!(body["error"], true);

    let asset = Response::network_error_text();
    assert_eq!(asset.status, 408);
    assert!(!asset.is_ok());
  }
}
