use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use storykeep::api::{NewStory, PhotoUpload, StoriesOutcome, StoryClient, StoryOutcome};
use storykeep::cache::ResponseCache;
use storykeep::config::Config;
use storykeep::connectivity::NetworkStatus;
use storykeep::http::{HttpFetcher, Request};
use storykeep::notifications::{PushKeys, PushSubscription};
use storykeep::router::FetchPolicyRouter;
use storykeep::session::{Credential, Session, SessionData};
use storykeep::store::{DetachedStore, DynRecordStore, SqliteRecordStore};
use storykeep::{logging, StoryRecord};

#[derive(Parser, Debug)]
#[command(name = "storykeep")]
#[command(about = "Offline-first client for the Dicoding story API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storykeep/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Treat the device as offline; reads are served from the local store
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List stories
  Stories {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    size: u32,
  },
  /// Show one story
  Story { id: String },
  /// Post a story (as a guest when not logged in)
  Post {
    #[arg(long)]
    description: String,
    #[arg(long)]
    photo: PathBuf,
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
  },
  /// Keep a story available offline
  Favorite { id: String },
  /// Drop a story from the local store
  Unfavorite { id: String },
  /// List stories held locally
  Favorites,
  /// Remove every locally held story
  ClearFavorites,
  Register {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  Login {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  Logout,
  /// Register a push subscription
  Subscribe {
    #[arg(long)]
    endpoint: String,
    #[arg(long)]
    p256dh: String,
    #[arg(long)]
    auth: String,
  },
  /// Remove a push subscription
  Unsubscribe {
    #[arg(long)]
    endpoint: String,
  },
  /// Precache the app shell
  Install,
  /// Prune cache partitions from other versions
  Activate,
  /// Route an arbitrary GET through the fetch policy and print the body
  Fetch {
    url: String,
    /// Treat it as a full-page navigation
    #[arg(long)]
    navigate: bool,
  },
}

/// Everything built once at startup.
struct Runtime {
  client: StoryClient,
  router: Arc<FetchPolicyRouter>,
  session: Session,
  credential: Option<Credential>,
}

fn build_runtime(config: &Config, offline: bool) -> Result<Runtime> {
  let data_dir = config.data_dir()?;

  let store: DynRecordStore = match SqliteRecordStore::open(&data_dir.join("stories.db")) {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, "record store unavailable, offline features disabled");
      Arc::new(DetachedStore::new(e.to_string()))
    }
  };

  let responses = match ResponseCache::open(&data_dir.join("responses.db")) {
    Ok(cache) => cache,
    Err(e) => {
      warn!(error = %e, "response cache unavailable, using a temporary one");
      ResponseCache::open_in_memory().map_err(|e| eyre!("Failed to create response cache: {}", e))?
    }
  };

  let settings = config.router_settings()?;
  let fetcher = HttpFetcher::new(config.timeout(), &settings.app_origin)
    .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

  let router = Arc::new(FetchPolicyRouter::new(
    Arc::new(fetcher),
    Arc::new(responses),
    store.clone(),
    settings,
  ));

  let client = StoryClient::new(
    router.clone(),
    store,
    Arc::new(NetworkStatus::new(!offline)),
  );

  let session = Session::new(&data_dir);
  let credential = session.credential()?;

  Ok(Runtime {
    client,
    router,
    session,
    credential,
  })
}

fn print_story(story: &StoryRecord) {
  let created = story
    .created()
    .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| story.created_at.clone());
  println!("{}  {}  ({})", story.id, story.name, created);
  println!("    {}", story.description);
  if let Some((lat, lon)) = story.location() {
    println!("    at {:.5}, {:.5}", lat, lon);
  }
}

fn print_stories(outcome: &StoriesOutcome) {
  if outcome.needs_auth {
    println!("Login required. Run `storykeep login`.");
    return;
  }
  if outcome.from_cache {
    println!("(offline copy)");
  }
  if let Some(e) = &outcome.error {
    println!("warning: {}", e);
  }
  if outcome.stories.is_empty() {
    println!("No stories.");
  }
  for story in &outcome.stories {
    print_story(story);
  }
}

fn print_detail(outcome: &StoryOutcome) {
  if outcome.needs_auth {
    println!("Login required. Run `storykeep login`.");
    return;
  }
  if outcome.from_cache {
    println!("(offline copy)");
  }
  match (&outcome.story, &outcome.error) {
    (Some(story), _) => {
      print_story(story);
      println!("    {}", story.photo_url);
    }
    (None, Some(e)) => println!("Story unavailable: {}", e),
    (None, None) => println!("Story not found."),
  }
}

fn mime_for(path: &std::path::Path) -> &'static str {
  match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
    Some("png") => "image/png",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    _ => "image/jpeg",
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config.data_dir()?)?;

  let rt = build_runtime(&config, args.offline)?;
  let credential = rt.credential.as_ref();

  match args.command {
    Command::Stories { page, size } => {
      print_stories(&rt.client.get_stories(credential, page, size).await);
    }
    Command::Story { id } => {
      print_detail(&rt.client.get_story_detail(credential, &id).await);
    }
    Command::Post {
      description,
      photo,
      lat,
      lon,
    } => {
      let bytes = std::fs::read(&photo)
        .map_err(|e| eyre!("Failed to read photo {}: {}", photo.display(), e))?;
      let file_name = photo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo.jpg".to_string());
      let story = NewStory {
        description,
        photo: PhotoUpload {
          file_name,
          mime: mime_for(&photo).to_string(),
          bytes,
        },
        lat,
        lon,
      };
      let outcome = rt.client.add_story(credential, &story).await;
      println!("{}", outcome.message);
    }
    Command::Favorite { id } => {
      let detail = rt.client.get_story_detail(credential, &id).await;
      match &detail.story {
        Some(story) => println!("{}", rt.client.favorite(story).message),
        None if detail.needs_auth => println!("Login required. Run `storykeep login`."),
        None => print_detail(&detail),
      }
    }
    Command::Unfavorite { id } => println!("{}", rt.client.unfavorite(&id).message),
    Command::Favorites => print_stories(&rt.client.favorites()),
    Command::ClearFavorites => println!("{}", rt.client.clear_favorites().message),
    Command::Register {
      name,
      email,
      password,
    } => {
      println!("{}", rt.client.register(&name, &email, &password).await.message);
    }
    Command::Login { email, password } => {
      let outcome = rt.client.login(&email, &password).await;
      match outcome.user {
        Some(user) if outcome.success => {
          let data = SessionData::from(user);
          rt.session.save(&data)?;
          println!("Logged in as {}", data.name);
        }
        _ => println!("Login failed: {}", outcome.message),
      }
    }
    Command::Logout => {
      rt.session.clear()?;
      println!("Logged out");
    }
    Command::Subscribe {
      endpoint,
      p256dh,
      auth,
    } => {
      let subscription = PushSubscription {
        endpoint,
        keys: PushKeys { p256dh, auth },
      };
      println!("{}", rt.client.subscribe(credential, &subscription).await.message);
    }
    Command::Unsubscribe { endpoint } => {
      println!("{}", rt.client.unsubscribe(credential, &endpoint).await.message);
    }
    Command::Install => {
      let count = rt
        .router
        .install()
        .await
        .map_err(|e| eyre!("Failed to cache app shell: {}", e))?;
      println!("Cached {} app shell assets", count);
    }
    Command::Activate => {
      let removed = rt
        .router
        .activate()
        .map_err(|e| eyre!("Failed to prune caches: {}", e))?;
      if removed.is_empty() {
        println!("No stale cache partitions");
      }
      for name in removed {
        println!("Removed {}", name);
      }
    }
    Command::Fetch { url, navigate } => {
      let url = url::Url::parse(&url).map_err(|e| eyre!("Invalid URL {}: {}", url, e))?;
      let request = if navigate {
        Request::get(url).navigate()
      } else {
        Request::get(url)
      };
      let routed = rt.router.handle(&request).await;
      eprintln!(
        "status {}{}",
        routed.response.status,
        if routed.from_cache { " (cache)" } else { "" }
      );
      if let Some(e) = &routed.error {
        eprintln!("warning: {}", e);
      }
      println!("{}", routed.response.text());
    }
  }

  Ok(())
}
