//! Router configuration and request classification.

use serde::Deserialize;
use url::Url;

use crate::http::Request;

/// Names and version of the response-cache partitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
  pub shell_cache_name: String,
  pub data_cache_name: String,
  pub version: u32,
}

impl Default for CachePolicy {
  fn default() -> Self {
    Self {
      shell_cache_name: "app-shell".to_string(),
      data_cache_name: "data-cache".to_string(),
      version: 1,
    }
  }
}

impl CachePolicy {
  /// Partition holding static assets, e.g. `app-shell-v1`.
  pub fn shell_partition(&self) -> String {
    format!("{}-v{}", self.shell_cache_name, self.version)
  }

  /// Partition holding API responses, e.g. `data-cache-v1`.
  pub fn data_partition(&self) -> String {
    format!("{}-v{}", self.data_cache_name, self.version)
  }
}

/// Everything the router needs to know about the deployment.
#[derive(Debug, Clone)]
pub struct RouterSettings {
  pub policy: CachePolicy,
  /// Requests to this origin are remote data
  pub api_base: Url,
  /// Origin serving the app shell
  pub app_origin: Url,
  /// Page served for failed navigations
  pub offline_page: Url,
  /// Assets precached by `install`
  pub shell_assets: Vec<Url>,
}

/// Which strategy a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
  /// Matches the API origin: network-first
  RemoteData,
  /// Everything else: cache-first
  StaticAsset,
}

impl RouterSettings {
  pub fn classify(&self, request: &Request) -> RequestTarget {
    if request.url.origin() == self.api_base.origin() {
      RequestTarget::RemoteData
    } else {
      RequestTarget::StaticAsset
    }
  }
}
