//! Fetch policy router.
//!
//! Sits between callers and the network, picking a strategy per request:
//! - remote data (API origin): network-first, falling back to the data cache,
//!   and writing decoded stories through to the local record store
//! - static assets (anything else): cache-first against the app shell
//!
//! Callers always get a well-formed response back; failures travel alongside
//! it in `Routed::error`.

mod lifecycle;
mod policy;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::types::ApiEnvelope;
use crate::cache::ResponseCache;
use crate::error::{DataError, Result};
use crate::http::{DynFetcher, Method, Request, RequestMode, Response};
use crate::store::DynRecordStore;

pub use policy::{CachePolicy, RequestTarget, RouterSettings};

/// A response plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
  pub response: Response,
  /// Served from a cache partition instead of the network
  pub from_cache: bool,
  /// Set whenever the network path failed, even if a cached copy was found
  pub error: Option<DataError>,
  /// Stories carried by a fresh answer could not be written to the local store
  pub persist_error: Option<DataError>,
}

impl Routed {
  fn network(response: Response) -> Self {
    Self {
      response,
      from_cache: false,
      error: None,
      persist_error: None,
    }
  }

  fn cached(response: Response, error: Option<DataError>) -> Self {
    Self {
      response,
      from_cache: true,
      error,
      persist_error: None,
    }
  }

  fn synthesized(response: Response, error: DataError) -> Self {
    Self {
      response,
      from_cache: false,
      error: Some(error),
      persist_error: None,
    }
  }
}

pub struct FetchPolicyRouter {
  fetcher: DynFetcher,
  responses: Arc<ResponseCache>,
  store: DynRecordStore,
  settings: RouterSettings,
}

impl FetchPolicyRouter {
  pub fn new(
    fetcher: DynFetcher,
    responses: Arc<ResponseCache>,
    store: DynRecordStore,
    settings: RouterSettings,
  ) -> Self {
    Self {
      fetcher,
      responses,
      store,
      settings,
    }
  }

  pub fn settings(&self) -> &RouterSettings {
    &self.settings
  }

  /// Route one request through the strategy matching its target.
  pub async fn handle(&self, request: &Request) -> Routed {
    let target = self.settings.classify(request);

    // Only GET responses are ever cached.
    if request.method != Method::Get {
      return self.pass_through(target, request).await;
    }

    match target {
      RequestTarget::RemoteData => self.network_first(request).await,
      RequestTarget::StaticAsset => self.cache_first(request).await,
    }
  }

  async fn pass_through(&self, target: RequestTarget, request: &Request) -> Routed {
    match self.fetcher.fetch(request).await {
      Ok(response) => Routed::network(response),
      Err(e) => {
        warn!(url = %request.url, error = %e, "request failed");
        let placeholder = match target {
          RequestTarget::RemoteData => Response::network_error_json(),
          RequestTarget::StaticAsset => Response::network_error_text(),
        };
        Routed::synthesized(placeholder, e)
      }
    }
  }

  /// Network-first for API requests.
  ///
  /// 1. Fetch from network
  /// 2. On a 2xx: JSON bodies must be a non-error envelope; cache it, write
  ///    stories through, return it. Other payloads (photos) are cached as is
  /// 3. On a non-2xx: return it untouched (the server answered)
  /// 4. Otherwise: last cached response for this request, or a synthesized error
  async fn network_first(&self, request: &Request) -> Routed {
    let response = match self.fetcher.fetch(request).await {
      Ok(response) => response,
      Err(e) => return self.data_fallback(request, e),
    };

    if !response.is_ok() {
      debug!(url = %request.url, status = response.status, "passing through error status");
      return Routed::network(response);
    }

    if !response.is_json() {
      self.cache_data(request, &response);
      return Routed::network(response);
    }

    let envelope = match response.decode::<ApiEnvelope>().and_then(ApiEnvelope::into_result) {
      Ok(envelope) => envelope,
      Err(e) => return self.data_fallback(request, e),
    };

    self.cache_data(request, &response);
    let persist_error = self.write_through(&envelope).err();

    Routed {
      persist_error,
      ..Routed::network(response)
    }
  }

  fn cache_data(&self, request: &Request, response: &Response) {
    let partition = self.settings.policy.data_partition();
    if let Err(e) = self.responses.put(&partition, request, response) {
      warn!(url = %request.url, error = %e, "failed to cache response");
    }
  }

  fn data_fallback(&self, request: &Request, error: DataError) -> Routed {
    warn!(url = %request.url, error = %error, "network request failed, trying data cache");

    let partition = self.settings.policy.data_partition();
    match self.responses.lookup(&partition, request) {
      Ok(Some(cached)) => {
        info!(url = %request.url, "serving cached data response");
        Routed::cached(cached, Some(error))
      }
      Ok(None) => Routed::synthesized(Response::network_error_json(), error),
      Err(e) => {
        warn!(error = %e, "data cache unavailable");
        Routed::synthesized(Response::network_error_json(), error)
      }
    }
  }

  /// Upsert stories carried by a list or detail payload.
  fn write_through(&self, envelope: &ApiEnvelope) -> Result<()> {
    let result = match (&envelope.list_story, &envelope.story) {
      (Some(stories), _) => self.store.put_many(stories),
      (None, Some(story)) => self.store.put(story),
      (None, None) => return Ok(()),
    };

    result.map_err(|e| {
      warn!(error = %e, "failed to write stories to local store");
      e
    })
  }

  /// Cache-first for static assets.
  ///
  /// 1. Exact match in the app shell: return it, no network
  /// 2. Fetch; cache a copy only if it is a plain same-origin 200
  /// 3. On failure: offline page for navigations, placeholder otherwise
  async fn cache_first(&self, request: &Request) -> Routed {
    let partition = self.settings.policy.shell_partition();

    match self.responses.lookup(&partition, request) {
      Ok(Some(hit)) => {
        debug!(url = %request.url, "returning from shell cache");
        return Routed::cached(hit, None);
      }
      Ok(None) => {}
      Err(e) => warn!(error = %e, "shell cache unavailable"),
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.is_reusable() {
          if let Err(e) = self.responses.put(&partition, request, &response) {
            warn!(url = %request.url, error = %e, "failed to cache asset");
          }
        } else {
          debug!(url = %request.url, status = response.status, "response not valid for caching");
        }
        Routed::network(response)
      }
      Err(e) => self.asset_fallback(request, e),
    }
  }

  fn asset_fallback(&self, request: &Request, error: DataError) -> Routed {
    warn!(url = %request.url, error = %error, "asset fetch failed");

    if request.mode == RequestMode::Navigate {
      match self.offline_page() {
        Ok(Some(page)) => return Routed::cached(page, Some(error)),
        Ok(None) => warn!("offline page missing from shell cache"),
        Err(e) => warn!(error = %e, "shell cache unavailable"),
      }
    }

    Routed::synthesized(Response::network_error_text(), error)
  }

  fn offline_page(&self) -> Result<Option<Response>> {
    let request = Request::get(self.settings.offline_page.clone());
    self
      .responses
      .lookup(&self.settings.policy.shell_partition(), &request)
  }
}
