//! End-to-end scenarios across the client, router, response cache and record
//! store, using on-disk databases.

mod common;

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use url::Url;

use storykeep::api::{StoriesOutcome, StoryClient};
use storykeep::cache::ResponseCache;
use storykeep::connectivity::NetworkStatus;
use storykeep::http::{Request, Response};
use storykeep::router::{CachePolicy, FetchPolicyRouter, RouterSettings};
use storykeep::session::Credential;
use storykeep::store::{RecordStore, SqliteRecordStore};
use storykeep::StoryRecord;

use common::ScriptedFetcher;

const STORIES_URL: &str = "https://story-api.dicoding.dev/v1/stories?page=1&size=10&location=1";

struct Harness {
  fetcher: Arc<ScriptedFetcher>,
  store: Arc<SqliteRecordStore>,
  status: Arc<NetworkStatus>,
  router: Arc<FetchPolicyRouter>,
  client: StoryClient,
}

fn harness(dir: &Path) -> Harness {
  let fetcher = Arc::new(ScriptedFetcher::new());
  let store = Arc::new(SqliteRecordStore::open(&dir.join("stories.db")).unwrap());
  let responses = Arc::new(ResponseCache::open(&dir.join("responses.db")).unwrap());
  let status = Arc::new(NetworkStatus::new(true));

  let app = Url::parse("https://stories.example/").unwrap();
  let settings = RouterSettings {
    policy: CachePolicy::default(),
    api_base: Url::parse("https://story-api.dicoding.dev/v1").unwrap(),
    offline_page: app.join("/offline.html").unwrap(),
    shell_assets: vec![
      app.join("/").unwrap(),
      app.join("/offline.html").unwrap(),
    ],
    app_origin: app,
  };

  let router = Arc::new(FetchPolicyRouter::new(
    fetcher.clone(),
    responses,
    store.clone(),
    settings,
  ));
  let client = StoryClient::new(router.clone(), store.clone(), status.clone());

  Harness {
    fetcher,
    store,
    status,
    router,
    client,
  }
}

fn record(id: &str, name: &str) -> StoryRecord {
  StoryRecord {
    id: id.to_string(),
    name: name.to_string(),
    description: "first light over the harbour".to_string(),
    photo_url: format!("https://story-api.dicoding.dev/images/stories/{}.jpg", id),
    created_at: "2024-05-12T07:30:00.000Z".to_string(),
    lat: Some(-6.1),
    lon: Some(106.8),
  }
}

#[tokio::test]
async fn offline_device_lists_stored_record() {
  let dir = tempfile::tempdir().unwrap();
  let h = harness(dir.path());
  h.store.put(&record("s1", "A")).unwrap();
  h.status.set_online(false);

  let outcome = h
    .client
    .get_stories(Some(&Credential::new("token")), 1, 10)
    .await;

  assert_eq!(
    outcome,
    StoriesOutcome {
      needs_auth: false,
      stories: vec![record("s1", "A")],
      from_cache: true,
      error: None,
    }
  );
}

#[tokio::test]
async fn missing_credential_short_circuits() {
  let dir = tempfile::tempdir().unwrap();
  let h = harness(dir.path());
  h.fetcher.respond(
    STORIES_URL,
    Response::json(200, &json!({ "error": false, "message": "ok", "listStory": [] })),
  );

  let outcome = h.client.get_stories(None, 1, 10).await;

  assert!(outcome.needs_auth);
  assert!(outcome.stories.is_empty());
  assert_eq!(h.fetcher.call_count(), 0);
}

#[tokio::test]
async fn favorite_then_unfavorite_leaves_store_without_it() {
  let dir = tempfile::tempdir().unwrap();
  let h = harness(dir.path());
  h.store.put(&record("s1", "A")).unwrap();

  assert!(h.client.favorite(&record("s2", "B")).success);
  assert!(h.client.unfavorite("s2").success);

  let ids: Vec<String> = h.store.get_all().unwrap().into_iter().map(|s| s.id).collect();
  assert_eq!(ids, vec!["s1"]);
}

#[tokio::test]
async fn stories_fetched_online_survive_into_offline_session() {
  let dir = tempfile::tempdir().unwrap();
  let token = Credential::new("token");

  {
    let h = harness(dir.path());
    h.fetcher.respond(
      STORIES_URL,
      Response::json(
        200,
        &json!({ "error": false, "message": "ok", "listStory": [record("s1", "A"), record("s2", "B")] }),
      ),
    );
    let outcome = h.client.get_stories(Some(&token), 1, 10).await;
    assert!(!outcome.from_cache);
    assert_eq!(outcome.stories.len(), 2);
  }

  // A fresh process over the same files, with the network gone.
  let h = harness(dir.path());
  h.fetcher.set_unreachable(true);

  let listing = h.client.get_stories(Some(&token), 1, 10).await;
  assert!(listing.from_cache);
  assert_eq!(listing.stories, vec![record("s1", "A"), record("s2", "B")]);

  h.status.set_online(false);
  let detail = h.client.get_story_detail(Some(&token), "s2").await;
  assert_eq!(detail.story, Some(record("s2", "B")));
  assert!(detail.from_cache);
}

#[tokio::test]
async fn installed_shell_serves_offline_navigation() {
  let dir = tempfile::tempdir().unwrap();
  let h = harness(dir.path());
  h.fetcher
    .respond("https://stories.example/", Response::new(200, "text/html", "<main>"));
  h.fetcher.respond(
    "https://stories.example/offline.html",
    Response::new(200, "text/html", "<p>offline</p>"),
  );

  assert_eq!(h.router.install().await.unwrap(), 2);
  assert!(h.router.activate().unwrap().is_empty());

  h.fetcher.set_unreachable(true);
  let before = h.fetcher.call_count();

  let shell = h
    .router
    .handle(&Request::get(Url::parse("https://stories.example/").unwrap()))
    .await;
  assert!(shell.from_cache);
  assert_eq!(shell.response.text(), "<main>");
  assert_eq!(h.fetcher.call_count(), before);

  // Hash routes share the shell entry.
  let deep_link = h
    .router
    .handle(&Request::get(Url::parse("https://stories.example/#/detail/s1").unwrap()).navigate())
    .await;
  assert_eq!(deep_link.response.text(), "<main>");

  let unknown_page = h
    .router
    .handle(&Request::get(Url::parse("https://stories.example/about").unwrap()).navigate())
    .await;
  assert_eq!(unknown_page.response.text(), "<p>offline</p>");
  assert!(unknown_page.error.is_some());
}
