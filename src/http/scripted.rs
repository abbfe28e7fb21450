//! In-memory fetcher for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::fetcher::Fetcher;
use super::types::{Request, Response};
use crate::error::{DataError, Result};

/// Answers from a fixed script of URL -> response.
///
/// Unscripted URLs and an unreachable fetcher fail with `NetworkUnavailable`.
/// Every attempted request is recorded.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
  routes: Mutex<HashMap<String, Response>>,
  calls: Mutex<Vec<Request>>,
  unreachable: Mutex<bool>,
}

impl ScriptedFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer requests for `url` (any method) with `response`.
  pub fn respond(&self, url: &str, response: Response) -> &Self {
    self.routes.lock().unwrap().insert(url.to_string(), response);
    self
  }

  pub fn set_unreachable(&self, unreachable: bool) {
    *self.unreachable.lock().unwrap() = unreachable;
  }

  /// Requests seen so far, in order.
  pub fn calls(&self) -> Vec<Request> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    self.calls.lock().unwrap().push(request.clone());

    if *self.unreachable.lock().unwrap() {
      return Err(DataError::NetworkUnavailable("network unreachable".into()));
    }

    self
      .routes
      .lock()
      .unwrap()
      .get(request.url.as_str())
      .cloned()
      .ok_or_else(|| DataError::NetworkUnavailable(format!("no route to {}", request.url)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  #[tokio::test]
  async fn scripted_fetcher_answers_and_records() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
      "https://app.test/index.html",
      Response::new(200, "text/html", "<html>"),
    );

    let hit = Request::get(Url::parse("https://app.test/index.html").unwrap());
    let miss = Request::get(Url::parse("https://app.test/missing.js").unwrap());

    assert_eq!(fetcher.fetch(&hit).await.unwrap().text(), "<html>");
    assert!(matches!(
      fetcher.fetch(&miss).await,
      Err(DataError::NetworkUnavailable(_))
    ));
    assert_eq!(fetcher.call_count(), 2);

    fetcher.set_unreachable(true);
    assert!(fetcher.fetch(&hit).await.is_err());
    assert_eq!(fetcher.calls()[2].url, hit.url);
  }
}
