//! The record store contract.

use crate::error::{DataError, Result};
use crate::model::StoryRecord;

/// Durable key-value persistence of story records, keyed by `id`.
///
/// The store doubles as the offline cache and the favorites list: membership
/// means "available offline", not "authoritative".
pub trait RecordStore: Send + Sync {
  /// Every stored record, in insertion order. Empty when nothing is stored.
  fn get_all(&self) -> Result<Vec<StoryRecord>>;

  /// Point lookup. An empty id is simply absent.
  fn get_by_id(&self, id: &str) -> Result<Option<StoryRecord>>;

  /// Upsert by id. A record without an id is ignored.
  fn put(&self, record: &StoryRecord) -> Result<()>;

  /// Upsert all records as one unit: either every record becomes visible or
  /// none does.
  fn put_many(&self, records: &[StoryRecord]) -> Result<()>;

  /// Remove a record; absent ids are not an error.
  fn delete_by_id(&self, id: &str) -> Result<()>;

  /// Remove every record.
  fn clear(&self) -> Result<()>;
}

/// A store whose engine could not be opened.
///
/// Every call reports `StorageUnavailable`, so offline features degrade while
/// the network path keeps working.
pub struct DetachedStore {
  reason: String,
}

impl DetachedStore {
  pub fn new(reason: impl Into<String>) -> Self {
    Self {
      reason: reason.into(),
    }
  }

  fn unavailable<T>(&self) -> Result<T> {
    Err(DataError::StorageUnavailable(self.reason.clone()))
  }
}

impl RecordStore for DetachedStore {
  fn get_all(&self) -> Result<Vec<StoryRecord>> {
    self.unavailable()
  }

  fn get_by_id(&self, _id: &str) -> Result<Option<StoryRecord>> {
    self.unavailable()
  }

  fn put(&self, _record: &StoryRecord) -> Result<()> {
    self.unavailable()
  }

  fn put_many(&self, _records: &[StoryRecord]) -> Result<()> {
    self.unavailable()
  }

  fn delete_by_id(&self, _id: &str) -> Result<()> {
    self.unavailable()
  }

  fn clear(&self) -> Result<()> {
    self.unavailable()
  }
}
