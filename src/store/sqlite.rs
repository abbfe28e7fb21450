//! SQLite implementation of the record store.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::traits::RecordStore;
use crate::error::{DataError, Result};
use crate::model::StoryRecord;

/// Version stamped into `PRAGMA user_version` once the schema exists.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema for version 1.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY NOT NULL,
    data BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const UPSERT: &str = "INSERT INTO stories (id, data) VALUES (?1, ?2)
   ON CONFLICT(id) DO UPDATE SET data = excluded.data, stored_at = datetime('now')";

/// SQLite-based record store.
pub struct SqliteRecordStore {
  conn: Mutex<Connection>,
}

impl SqliteRecordStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        DataError::StorageUnavailable(format!(
          "failed to create store directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// A private in-memory store, gone when dropped.
  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.upgrade()?;
    Ok(store)
  }

  /// Create the schema if the file predates it. Runs at most once per file.
  fn upgrade(&self) -> Result<()> {
    let conn = self.lock()?;
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current < SCHEMA_VERSION {
      info!(from = current, to = SCHEMA_VERSION, "upgrading record store schema");
      conn.execute_batch(STORE_SCHEMA)?;
      conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
  }

  /// Schema version currently recorded in the database.
  pub fn schema_version(&self) -> Result<i64> {
    let conn = self.lock()?;
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| DataError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }
}

fn encode(record: &StoryRecord) -> Result<Vec<u8>> {
  serde_json::to_vec(record)
    .map_err(|e| DataError::StorageUnavailable(format!("failed to serialize record: {}", e)))
}

fn decode(data: &[u8]) -> Result<StoryRecord> {
  serde_json::from_slice(data)
    .map_err(|e| DataError::StorageUnavailable(format!("failed to deserialize record: {}", e)))
}

impl RecordStore for SqliteRecordStore {
  fn get_all(&self) -> Result<Vec<StoryRecord>> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare("SELECT data FROM stories ORDER BY rowid")?;

    let rows: Vec<Vec<u8>> = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<_>>()?;

    // Rows that no longer decode are skipped rather than failing the listing.
    Ok(rows.iter().filter_map(|data| decode(data).ok()).collect())
  }

  fn get_by_id(&self, id: &str) -> Result<Option<StoryRecord>> {
    if id.is_empty() {
      return Ok(None);
    }

    let conn = self.lock()?;
    let data: Option<Vec<u8>> = conn
      .query_row("SELECT data FROM stories WHERE id = ?1", params![id], |row| {
        row.get(0)
      })
      .optional()?;

    data.map(|d| decode(&d)).transpose()
  }

  fn put(&self, record: &StoryRecord) -> Result<()> {
    if !record.has_key() {
      debug!("ignoring record without id");
      return Ok(());
    }

    let data = encode(record)?;
    let conn = self.lock()?;
    conn.execute(UPSERT, params![record.id, data])?;
    Ok(())
  }

  fn put_many(&self, records: &[StoryRecord]) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    {
      let mut stmt = tx.prepare(UPSERT)?;
      for (position, record) in records.iter().enumerate() {
        if !record.has_key() {
          // Dropping the transaction rolls back every earlier write.
          return Err(DataError::MissingKey { position });
        }
        stmt.execute(params![record.id, encode(record)?])?;
      }
    }

    tx.commit()?;
    debug!(count = records.len(), "stored story records");
    Ok(())
  }

  fn delete_by_id(&self, id: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM stories WHERE id = ?1", params![id])?;
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM stories", [])?;
    Ok(())
  }
}
