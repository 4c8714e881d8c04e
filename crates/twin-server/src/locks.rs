//! Per-session turn serialization.
//!
//! Two turns for the same incoming key would otherwise race through
//! load, rename and save. Turns for different keys never contend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use twin_core::SessionKey;

type Slots = HashMap<SessionKey, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct SessionLocks {
  inner: Arc<Mutex<Slots>>,
}

/// Held for the duration of one turn. Dropping it releases the key and
/// forgets the slot once nobody else is waiting on it.
pub struct SessionGuard {
  key:   SessionKey,
  slots: Arc<Mutex<Slots>>,
  guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait until no other turn holds `key`.
  pub async fn lock(&self, key: &SessionKey) -> SessionGuard {
    let slot = {
      let mut slots = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      slots.entry(key.clone()).or_default().clone()
    };
    let guard = slot.lock_owned().await;
    SessionGuard { key: key.clone(), slots: self.inner.clone(), guard: Some(guard) }
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

impl Drop for SessionGuard {
  fn drop(&mut self) {
    self.guard.take();
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    if slots.get(&self.key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
      slots.remove(&self.key);
    }
  }
}
