//! Story client: the read and write paths used by presentation code.
//!
//! Every call returns an outcome struct. Failures are logged and attached to
//! the outcome; nothing is thrown at the caller.

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::types::{
  ActionOutcome, ApiEnvelope, LoginOutcome, NewStory, StoriesOutcome, StoryOutcome,
};
use crate::connectivity::DynConnectivity;
use crate::error::{DataError, Result};
use crate::http::{FormPart, Request, RequestBody};
use crate::model::StoryRecord;
use crate::router::FetchPolicyRouter;
use crate::session::Credential;
use crate::store::DynRecordStore;

/// A decoded API answer and whether it came from the data cache.
struct Fetched {
  envelope: ApiEnvelope,
  from_cache: bool,
  /// For a cached answer, why the network failed. For a fresh one, why its
  /// stories were not persisted.
  error: Option<DataError>,
}

#[derive(Clone)]
pub struct StoryClient {
  router: Arc<FetchPolicyRouter>,
  store: DynRecordStore,
  connectivity: DynConnectivity,
}

impl StoryClient {
  pub fn new(
    router: Arc<FetchPolicyRouter>,
    store: DynRecordStore,
    connectivity: DynConnectivity,
  ) -> Self {
    Self {
      router,
      store,
      connectivity,
    }
  }

  /// API URL for the given path segments below the configured base.
  pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.router.settings().api_base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn fetch_envelope(&self, request: Request) -> Result<Fetched> {
    let routed = self.router.handle(&request).await;

    if !routed.from_cache {
      if let Some(e) = routed.error {
        return Err(e);
      }
    }

    let envelope = routed.response.decode::<ApiEnvelope>()?.into_result()?;
    Ok(Fetched {
      envelope,
      from_cache: routed.from_cache,
      error: routed.error.or(routed.persist_error),
    })
  }

  /// Send a write request and fold the answer into `{success, message}`.
  pub(crate) async fn submit(&self, request: Request) -> ActionOutcome {
    match self.fetch_envelope(request).await {
      Ok(fetched) => ActionOutcome::ok(fetched.envelope.message),
      Err(e) => {
        warn!(error = %e, "request failed");
        e.into()
      }
    }
  }

  // ==========================================================================
  // Read path
  // ==========================================================================

  /// List stories.
  ///
  /// Without a credential nothing is fetched. Offline, the local store answers.
  /// Online, the network answers and on any failure the local store does.
  pub async fn get_stories(
    &self,
    credential: Option<&Credential>,
    page: u32,
    size: u32,
  ) -> StoriesOutcome {
    let Some(credential) = credential else {
      return StoriesOutcome::needs_auth();
    };

    if !self.connectivity.is_online() {
      debug!("offline, listing stories from local store");
      return match self.store.get_all() {
        Ok(stories) => StoriesOutcome::cached(stories, None),
        Err(e) => StoriesOutcome::failed(e),
      };
    }

    let mut url = self.endpoint(&["stories"]);
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string())
      .append_pair("size", &size.to_string())
      .append_pair("location", "1");

    let fetched = self
      .fetch_envelope(Request::get(url).bearer(credential.token()))
      .await
      .and_then(|f| {
        let stories = f
          .envelope
          .list_story
          .ok_or_else(|| DataError::MalformedResponse("missing listStory".into()))?;
        Ok((stories, f.from_cache, f.error))
      });

    match fetched {
      Ok((stories, false, None)) => StoriesOutcome::network(stories),
      Ok((stories, false, Some(e))) => {
        warn!(error = %e, "failed to persist stories, using local store");
        match self.store.get_all() {
          Ok(stored) => StoriesOutcome::cached(stored, Some(e)),
          Err(_) => StoriesOutcome {
            error: Some(e),
            ..StoriesOutcome::network(stories)
          },
        }
      }
      Ok((stories, true, error)) => StoriesOutcome::cached(stories, error),
      Err(e) => {
        warn!(error = %e, "failed to get stories, using local store");
        match self.store.get_all() {
          Ok(stories) => StoriesOutcome::cached(stories, Some(e)),
          Err(store_err) => {
            warn!(error = %store_err, "local store unavailable");
            StoriesOutcome::failed(e)
          }
        }
      }
    }
  }

  /// Fetch one story.
  ///
  /// Offline, a stored copy is served if present; otherwise the fetch is still
  /// attempted.
  pub async fn get_story_detail(&self, credential: Option<&Credential>, id: &str) -> StoryOutcome {
    let Some(credential) = credential else {
      return StoryOutcome::needs_auth();
    };

    if !self.connectivity.is_online() {
      match self.store.get_by_id(id) {
        Ok(Some(story)) => return StoryOutcome::cached(story, None),
        Ok(None) => debug!(id, "offline and not stored, trying network anyway"),
        Err(e) => warn!(error = %e, "local store unavailable"),
      }
    }

    let request = Request::get(self.endpoint(&["stories", id])).bearer(credential.token());
    let fetched = self.fetch_envelope(request).await.and_then(|f| {
      let story = f
        .envelope
        .story
        .ok_or_else(|| DataError::MalformedResponse("missing story".into()))?;
      Ok((story, f.from_cache, f.error))
    });

    match fetched {
      Ok((story, false, None)) => StoryOutcome::network(story),
      Ok((story, false, Some(e))) => {
        warn!(id, error = %e, "failed to persist story, using local store");
        match self.store.get_by_id(id) {
          Ok(Some(stored)) => StoryOutcome::cached(stored, Some(e)),
          _ => StoryOutcome {
            error: Some(e),
            ..StoryOutcome::network(story)
          },
        }
      }
      Ok((story, true, error)) => StoryOutcome::cached(story, error),
      Err(e) => {
        warn!(id, error = %e, "failed to get story, using local store");
        match self.store.get_by_id(id) {
          Ok(Some(story)) => StoryOutcome::cached(story, Some(e)),
          Ok(None) => StoryOutcome::failed(e),
          Err(store_err) => {
            warn!(error = %store_err, "local store unavailable");
            StoryOutcome::failed(e)
          }
        }
      }
    }
  }

  // ==========================================================================
  // Write path
  // ==========================================================================

  /// Upload a story. Without a credential it is posted as a guest.
  pub async fn add_story(&self, credential: Option<&Credential>, story: &NewStory) -> ActionOutcome {
    let mut parts = vec![
      FormPart::Text {
        name: "description".into(),
        value: story.description.clone(),
      },
      FormPart::File {
        name: "photo".into(),
        file_name: story.photo.file_name.clone(),
        mime: story.photo.mime.clone(),
        bytes: story.photo.bytes.clone(),
      },
    ];
    if let Some((lat, lon)) = story.lat.zip(story.lon) {
      parts.push(FormPart::Text {
        name: "lat".into(),
        value: lat.to_string(),
      });
      parts.push(FormPart::Text {
        name: "lon".into(),
        value: lon.to_string(),
      });
    }

    let body = RequestBody::Multipart(parts);
    let request = match credential {
      Some(c) => Request::post(self.endpoint(&["stories"]), body).bearer(c.token()),
      None => Request::post(self.endpoint(&["stories", "guest"]), body),
    };

    self.submit(request).await
  }

  pub async fn register(&self, name: &str, email: &str, password: &str) -> ActionOutcome {
    let body = serde_json::json!({ "name": name, "email": email, "password": password });
    let request = Request::post(self.endpoint(&["register"]), RequestBody::Json(body));
    self.submit(request).await
  }

  /// Log in. Persisting the returned token is up to the caller.
  pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
    let body = serde_json::json!({ "email": email, "password": password });
    let request = Request::post(self.endpoint(&["login"]), RequestBody::Json(body));

    let result = self.fetch_envelope(request).await.and_then(|f| {
      let user = f
        .envelope
        .login_result
        .ok_or_else(|| DataError::MalformedResponse("missing loginResult".into()))?;
      Ok((f.envelope.message, user))
    });

    match result {
      Ok((message, user)) => LoginOutcome {
        success: true,
        message,
        user: Some(user),
      },
      Err(e) => {
        warn!(error = %e, "login failed");
        LoginOutcome {
          success: false,
          message: e.to_string(),
          user: None,
        }
      }
    }
  }

  // ==========================================================================
  // Favorites
  // ==========================================================================

  pub fn favorite(&self, story: &StoryRecord) -> ActionOutcome {
    if !story.has_key() {
      return ActionOutcome::failed("story has no id");
    }
    match self.store.put(story) {
      Ok(()) => ActionOutcome::ok("Saved to favorites"),
      Err(e) => e.into(),
    }
  }

  pub fn unfavorite(&self, id: &str) -> ActionOutcome {
    match self.store.delete_by_id(id) {
      Ok(()) => ActionOutcome::ok("Removed from favorites"),
      Err(e) => e.into(),
    }
  }

  pub fn favorites(&self) -> StoriesOutcome {
    match self.store.get_all() {
      Ok(stories) => StoriesOutcome::cached(stories, None),
      Err(e) => StoriesOutcome::failed(e),
    }
  }

  pub fn is_favorite(&self, id: &str) -> bool {
    matches!(self.store.get_by_id(id), Ok(Some(_)))
  }

  pub fn clear_favorites(&self) -> ActionOutcome {
    match self.store.clear() {
      Ok(()) => ActionOutcome::ok("Favorites cleared"),
      Err(e) => e.into(),
    }
  }
}
