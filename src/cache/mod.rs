//! Named, versioned response-cache partitions.
//!
//! Two partitions are in use at any time: the app shell (static assets) and
//! the data cache (last good API responses). Partition names carry a version
//! suffix so a version bump leaves the old ones behind for pruning.

mod storage;

pub use storage::ResponseCache;
