//! Install and activate steps for the cache partitions.

use futures::future::try_join_all;
use tracing::info;

use super::FetchPolicyRouter;
use crate::error::{DataError, Result};
use crate::http::Request;

impl FetchPolicyRouter {
  /// Precache every app-shell asset.
  ///
  /// All assets must fetch with a 2xx status, otherwise nothing is stored.
  /// Returns the number of cached assets.
  pub async fn install(&self) -> Result<usize> {
    let partition = self.settings.policy.shell_partition();
    info!(partition = %partition, assets = self.settings.shell_assets.len(), "caching app shell");

    let fetches = self.settings.shell_assets.iter().map(|url| async move {
      let request = Request::get(url.clone());
      let response = self.fetcher.fetch(&request).await?;
      if !response.is_ok() {
        return Err(DataError::NetworkUnavailable(format!(
          "{} answered with status {}",
          url, response.status
        )));
      }
      Ok::<_, DataError>((request, response))
    });

    let entries = try_join_all(fetches).await?;
    self.responses.put_all(&partition, &entries)?;

    Ok(entries.len())
  }

  /// Drop every partition that is neither the current shell nor data partition.
  ///
  /// Returns the names of the removed partitions.
  pub fn activate(&self) -> Result<Vec<String>> {
    let keep = [
      self.settings.policy.shell_partition(),
      self.settings.policy.data_partition(),
    ];

    let mut removed = Vec::new();
    for name in self.responses.partitions()? {
      if keep.contains(&name) {
        continue;
      }
      self.responses.delete_partition(&name)?;
      info!(partition = %name, "removed stale cache partition");
      removed.push(name);
    }

    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use url::Url;

  use super::*;
  use crate::cache::ResponseCache;
  use crate::http::{Response, ScriptedFetcher};
  use crate::router::{CachePolicy, RouterSettings};
  use crate::store::SqliteRecordStore;

  fn router(policy: CachePolicy) -> (Arc<ScriptedFetcher>, Arc<ResponseCache>, FetchPolicyRouter) {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let responses = Arc::new(ResponseCache::open_in_memory().unwrap());
    let app = Url::parse("https://app.test/").unwrap();
    let settings = RouterSettings {
      policy,
      api_base: Url::parse("https://story-api.dicoding.dev/v1").unwrap(),
      offline_page: app.join("/offline.html").unwrap(),
      shell_assets: vec![
        app.join("/index.html").unwrap(),
        app.join("/offline.html").unwrap(),
      ],
      app_origin: app,
    };
    let router = FetchPolicyRouter::new(
      fetcher.clone(),
      responses.clone(),
      Arc::new(SqliteRecordStore::open_in_memory().unwrap()),
      settings,
    );
    (fetcher, responses, router)
  }

  #[tokio::test]
  async fn install_caches_every_asset() {
    let (fetcher, responses, router) = router(CachePolicy::default());
    fetcher.respond("https://app.test/index.html", Response::new(200, "text/html", "<html>"));
    fetcher.respond("https://app.test/offline.html", Response::new(200, "text/html", "offline"));

    assert_eq!(router.install().await.unwrap(), 2);

    let offline = Request::get(Url::parse("https://app.test/offline.html").unwrap());
    assert!(responses.lookup("app-shell-v1", &offline).unwrap().is_some());
  }

  #[tokio::test]
  async fn install_is_all_or_nothing() {
    let (fetcher, responses, router) = router(CachePolicy::default());
    fetcher.respond("https://app.test/index.html", Response::new(200, "text/html", "<html>"));
    fetcher.respond("https://app.test/offline.html", Response::new(404, "text/html", "nope"));

    assert!(router.install().await.is_err());
    assert!(responses.partitions().unwrap().is_empty());
  }

  #[tokio::test]
  async fn activate_prunes_other_versions() {
    let (_fetcher, responses, router) = router(CachePolicy {
      version: 2,
      ..CachePolicy::default()
    });
    let req = Request::get(Url::parse("https://app.test/index.html").unwrap());
    let resp = Response::new(200, "text/html", "<html>");
    for partition in ["app-shell-v1", "data-cache-v1", "app-shell-v2", "data-cache-v2"] {
      responses.put(partition, &req, &resp).unwrap();
    }

    let removed = router.activate().unwrap();

    assert_eq!(removed, vec!["app-shell-v1", "data-cache-v1"]);
    assert_eq!(responses.partitions().unwrap(), vec!["app-shell-v2", "data-cache-v2"]);
  }
}
