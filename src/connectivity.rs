//! Online/offline signal consulted before touching the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait Connectivity: Send + Sync {
  fn is_online(&self) -> bool;
}

pub type DynConnectivity = Arc<dyn Connectivity>;

/// A settable online flag.
#[derive(Debug)]
pub struct NetworkStatus {
  online: AtomicBool,
}

impl NetworkStatus {
  pub fn new(online: bool) -> Self {
    Self {
      online: AtomicBool::new(online),
    }
  }

  pub fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::Relaxed);
  }
}

impl Default for NetworkStatus {
  fn default() -> Self {
    Self::new(true)
  }
}

impl Connectivity for NetworkStatus {
  fn is_online(&self) -> bool {
    self.online.load(Ordering::Relaxed)
  }
}
