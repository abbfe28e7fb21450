//! Shared fixtures for the integration tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use storykeep::error::{DataError, Result};
use storykeep::http::{Fetcher, Request, Response};

/// Fetcher answering from a URL -> response script; anything unscripted is
/// unreachable.
#[derive(Default)]
pub struct ScriptedFetcher {
  routes: Mutex<HashMap<String, Response>>,
  calls: Mutex<usize>,
  unreachable: Mutex<bool>,
}

impl ScriptedFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, url: &str, response: Response) {
    self.routes.lock().unwrap().insert(url.to_string(), response);
  }

  pub fn set_unreachable(&self, unreachable: bool) {
    *self.unreachable.lock().unwrap() = unreachable;
  }

  pub fn call_count(&self) -> usize {
    *self.calls.lock().unwrap()
  }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    *self.calls.lock().unwrap() += 1;

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
