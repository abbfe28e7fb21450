//! Offline-first access to the Dicoding story API.
//!
//! - `store`: local record store of story records (offline copy and favorites)
//! - `cache`: named response-cache partitions
//! - `router`: network-first / cache-first fetch policy
//! - `api`: the read and write paths handed to presentation code

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod notifications;
pub mod router;
pub mod session;
pub mod store;

pub use error::DataError;
pub use model::StoryRecord;
