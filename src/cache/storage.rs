//! SQLite persistence for named response-cache partitions.

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::http::{Request, Response, ResponseKind};

/// Schema for cached responses.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cached_responses (
    partition TEXT NOT NULL,
    request_hash TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    kind TEXT NOT NULL,
    redirected INTEGER NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (partition, request_hash)
);

CREATE INDEX IF NOT EXISTS idx_cached_responses_partition
    ON cached_responses(partition);
"#;

const UPSERT: &str = "INSERT OR REPLACE INTO cached_responses
   (partition, request_hash, url, status, content_type, kind, redirected, body, cached_at)
   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))";

/// Response cache split into named partitions (`app-shell-v1`, `data-cache-v1`, ...).
pub struct ResponseCache {
  conn: Mutex<Connection>,
}

impl ResponseCache {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        DataError::StorageUnavailable(format!(
          "failed to create cache directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    Self::with_connection(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| DataError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }

  /// Exact match for `request` inside one partition.
  pub fn lookup(&self, partition: &str, request: &Request) -> Result<Option<Response>> {
    let conn = self.lock()?;
    let row = conn
      .query_row(
        "SELECT status, content_type, kind, redirected, body FROM cached_responses
         WHERE partition = ?1 AND request_hash = ?2",
        params![partition, request_hash(request)],
        |row| {
          let kind: String = row.get(2)?;
          Ok(Response {
            status: row.get(0)?,
            content_type: row.get(1)?,
            kind: ResponseKind::parse(&kind),
            redirected: row.get(3)?,
            body: row.get(4)?,
          })
        },
      )
      .optional()?;

    Ok(row)
  }

  /// Store (or replace) the response for `request` in `partition`.
  pub fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<()> {
    let conn = self.lock()?;
    insert(&conn, partition, request, response)?;
    debug!(partition, url = %request.url, "cached response");
    Ok(())
  }

  /// Store every entry in one transaction; nothing is stored if any write fails.
  pub fn put_all(&self, partition: &str, entries: &[(Request, Response)]) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    for (request, response) in entries {
      insert(&tx, partition, request, response)?;
    }
    tx.commit()?;
    Ok(())
  }

  /// Names of every partition holding at least one response.
  pub fn partitions(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;
    let mut stmt =
      conn.prepare("SELECT DISTINCT partition FROM cached_responses ORDER BY partition")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
  }

  /// Drop a whole partition. Returns how many responses were removed.
  pub fn delete_partition(&self, partition: &str) -> Result<usize> {
    let conn = self.lock()?;
    let removed = conn.execute(
      "DELETE FROM cached_responses WHERE partition = ?1",
      params![partition],
    )?;
    Ok(removed)
  }
}

fn insert(conn: &Connection, partition: &str, request: &Request, response: &Response) -> Result<()> {
  conn.execute(
    UPSERT,
    params![
      partition,
      request_hash(request),
      request.url.as_str(),
      response.status,
      response.content_type,
      response.kind.as_str(),
      response.redirected,
      response.body,
    ],
  )?;
  Ok(())
}

fn request_hash(request: &Request) -> String {
  let mut hasher = Sha256::new();
  hasher.update(request.cache_identity().as_bytes());
  hex::encode(hasher.finalize())
}
