use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::router::{CachePolicy, RouterSettings};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub app: AppConfig,
  /// Names and version of the cache partitions
  pub cache: CachePolicy,
  /// Where the store, cache, session and logs live (defaults to the XDG data dir)
  pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://story-api.dicoding.dev/v1".to_string(),
      timeout_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Origin serving the app shell; asset paths are resolved against it
  pub origin: String,
  pub offline_page: String,
  /// Assets precached on install (relative paths or absolute URLs)
  pub shell_assets: Vec<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      origin: "http://localhost:8080".to_string(),
      offline_page: "/offline.html".to_string(),
      shell_assets: [
        "/",
        "/index.html",
        "/offline.html",
        "/scripts/index.js",
        "/styles/styles.css",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
        "/images/logo.png",
        "/manifest.json",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./storykeep.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storykeep/config.yaml
  ///
  /// Built-in defaults are used when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("storykeep.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("storykeep").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Directory holding the record store, response cache, session and logs.
  pub fn data_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.data_dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("storykeep"))
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  pub fn app_origin(&self) -> Result<Url> {
    Url::parse(&self.app.origin)
      .map_err(|e| eyre!("Invalid app origin {}: {}", self.app.origin, e))
  }

  /// Resolve every URL the router needs.
  pub fn router_settings(&self) -> Result<RouterSettings> {
    let api_base = Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", self.api.base_url, e))?;
    if api_base.cannot_be_a_base() {
      return Err(eyre!("API base URL {} cannot hold paths", self.api.base_url));
    }

    let app_origin = self.app_origin()?;
    let resolve = |asset: &str| {
      app_origin
        .join(asset)
        .map_err(|e| eyre!("Invalid asset path {}: {}", asset, e))
    };

    let offline_page = resolve(&self.app.offline_page)?;
    let shell_assets = self
      .app
      .shell_assets
      .iter()
      .map(|a| resolve(a))
      .collect::<Result<Vec<_>>>()?;

    Ok(RouterSettings {
      policy: self.cache.clone(),
      api_base,
      app_origin,
      offline_page,
      shell_assets,
    })
  }
}
