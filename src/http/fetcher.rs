//! The network seam: a `Fetcher` turns a `Request` into a `Response`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::{Origin, Url};

use super::types::{FormPart, Method, Request, RequestBody, Response, ResponseKind};
use crate::error::{DataError, Result};

#[async_trait]
pub trait Fetcher: Send + Sync {
  /// Perform the request. Transport failures surface as `NetworkUnavailable`;
  /// any HTTP status, including errors, is a successful fetch.
  async fn fetch(&self, request: &Request) -> Result<Response>;
}

pub type DynFetcher = Arc<dyn Fetcher>;

/// reqwest-backed fetcher.
pub struct HttpFetcher {
  client: reqwest::Client,
  /// Responses from this origin are `Basic`, everything else `Cors`
  app_origin: Origin,
}

impl HttpFetcher {
  pub fn new(timeout: Duration, app_origin: &Url) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("storykeep/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      app_origin: app_origin.origin(),
    })
  }

  fn multipart(parts: &[FormPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
      form = match part {
        FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
        FormPart::File {
          name,
          file_name,
          mime,
          bytes,
        } => {
          let file = Part::bytes(bytes.clone())
            .file_name(file_name.clone())
            .mime_str(mime)
            .map_err(|e| DataError::MalformedResponse(format!("invalid mime type {}: {}", mime, e)))?;
          form.part(name.clone(), file)
        }
      };
    }
    Ok(form)
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let method = match request.method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Delete => reqwest::Method::DELETE,
    };

    let mut builder = self.client.request(method, request.url.clone());
    for (name, value) in &request.headers {
      builder = builder.header(name.as_str(), value.as_str());
    }
    builder = match &request.body {
      None => builder,
      Some(RequestBody::Json(value)) => builder.json(value),
      Some(RequestBody::Multipart(parts)) => builder.multipart(Self::multipart(parts)?),
    };

    debug!(method = request.method.as_str(), url = %request.url, "fetching");
    let resp = builder.send().await?;

    let status = resp.status().as_u16();
    let final_url = resp.url().clone();
    let content_type = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = resp.bytes().await?.to_vec();

    let kind = if final_url.origin() == self.app_origin {
      ResponseKind::Basic
    } else {
      ResponseKind::Cors
    };

    Ok(Response {
      status,
      content_type,
      body,
      kind,
      redirected: final_url != request.url,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn multipart_rejects_bad_mime() {
    let parts = vec![FormPart::File {
      name: "photo".into(),
      file_name: "a.jpg".into(),
      mime: "not a mime".into(),
      bytes: vec![1, 2, 3],
    }];
    assert!(HttpFetcher::multipart(&parts).is_err());
  }
}
