//! Credential context resolved once at startup.
//!
//! The bearer token is read here and handed explicitly to every data-access
//! call; nothing else in the crate looks it up on its own.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::api::types::ApiLoginResult;

/// Bearer token for the story API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn token(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(..)")
  }
}

/// What is persisted after a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
  pub user_id: String,
  pub name: String,
  pub token: String,
}

impl From<ApiLoginResult> for SessionData {
  fn from(r: ApiLoginResult) -> Self {
    Self {
      user_id: r.user_id,
      name: r.name,
      token: r.token,
    }
  }
}

/// Session file in the data directory.
pub struct Session {
  path: PathBuf,
}

impl Session {
  pub fn new(data_dir: &Path) -> Self {
    Self {
      path: data_dir.join("session.json"),
    }
  }

  /// Resolve the credential for this run.
  ///
  /// `STORYKEEP_TOKEN` wins over the session file.
  pub fn credential(&self) -> Result<Option<Credential>> {
    if let Ok(token) = std::env::var("STORYKEEP_TOKEN") {
      if !token.is_empty() {
        return Ok(Some(Credential::new(token)));
      }
    }

    Ok(self.load()?.map(|data| Credential::new(data.token)))
  }

  /// The stored session, if any.
  pub fn load(&self) -> Result<Option<SessionData>> {
    if !self.path.exists() {
      return Ok(None);
    }

    let contents = std::fs::read_to_string(&self.path)
      .map_err(|e| eyre!("Failed to read session file {}: {}", self.path.display(), e))?;

    let data = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse session file {}: {}", self.path.display(), e))?;

    Ok(Some(data))
  }

  pub fn save(&self, data: &SessionData) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(data)
      .map_err(|e| eyre!("Failed to serialize session: {}", e))?;

    std::fs::write(&self.path, contents)
      .map_err(|e| eyre!("Failed to write session file {}: {}", self.path.display(), e))
  }

  /// Forget the stored session. Missing file is fine.
  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove session file {}: {}", self.path.display(), e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn credential_debug_hides_token() {
    let cred = Credential::new("secret-token");
    assert_eq!(format!("{:?}", cred), "Credential(..)");
    assert_eq!(cred.token(), "secret-token");
  }

  #[test]
  fn save_load_clear() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(dir.path());
    assert_eq!(session.load().unwrap(), None);

    let data = SessionData {
      user_id: "user-1".into(),
      name: "Arif".into(),
      token: "ey.abc".into(),
    };
    session.save(&data).unwrap();
    assert_eq!(session.load().unwrap(), Some(data));

    session.clear().unwrap();
    session.clear().unwrap();
    assert_eq!(session.load().unwrap(), None);
  }
}
