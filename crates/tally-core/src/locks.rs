//! Per-key async locks.
//!
//! Each append-then-recompute sequence runs while holding the lock for the
//! subject or comment whose aggregate it rewrites. Unrelated keys never
//! contend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::id::{CommentId, SubjectId};

/// What a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
  Subject(SubjectId),
  Comment(CommentId),
}

/// Held for the duration of one mutation unit; released on drop.
pub type KeyGuard = OwnedMutexGuard<()>;

/// A lazily-populated table of one async mutex per key.
///
/// Slots are never removed, so the table grows with the number of distinct
/// subjects and comments written to.
#[derive(Debug, Default)]
pub struct KeyedLocks {
  slots: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
  pub fn new() -> Self { Self::default() }

  fn slot(&self, key: LockKey) -> Arc<AsyncMutex<()>> {
    // The map is only touched in this short synchronous section, so a
    // poisoned mutex still holds a consistent map.
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slots.entry(key).or_default())
  }

  /// Wait for exclusive access to `key`.
  pub async fn lock(&self, key: LockKey) -> KeyGuard {
    self.slot(key).lock_owned().await
  }

  /// Lock several keys at once. Keys are taken in sorted order and
  /// de-duplicated, so two callers locking overlapping sets cannot deadlock.
  pub async fn lock_all(&self, keys: impl IntoIterator<Item = LockKey>) -> Vec<KeyGuard> {
    let mut keys: Vec<LockKey> = keys.into_iter().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut guards = Vec::with_capacity(keys.len());
    for key in keys {
      guards.push(self.lock(key).await);
    }
    guards
  }
}
