//! Local record store for story records.
//!
//! Records survive restarts and network loss. The SQLite backend keeps one
//! logical table `stories` keyed by `id`, created by a version-gated upgrade
//! the first time a database file is opened.

mod sqlite;
mod traits;

use std::sync::Arc;

pub use sqlite::{SqliteRecordStore, SCHEMA_VERSION};
pub use traits::{DetachedStore, RecordStore};

pub type DynRecordStore = Arc<dyn RecordStore>;
