//! Cache storage trait and in-memory implementation.
//!
//! Cache entries hold untyped JSON so one storage instance can serve every
//! entity type; the layer re-types values on the way out. Durability is the
//! local store's job, not the cache's, so the only real backend is
//! in-memory.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::StoreError;

/// A single cached value with its insertion time.
#[derive(Debug, Clone)]
pub struct CachedValue {
  pub value: Value,
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  fn get(&self, hash: &str) -> Result<Option<CachedValue>, StoreError>;

  fn put(&self, hash: &str, value: Value) -> Result<(), StoreError>;

  fn remove(&self, hash: &str) -> Result<(), StoreError>;
}

/// In-memory cache storage. One instance per application; entries live for
/// the lifetime of the process or until invalidated.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CachedValue>>,
}

impl MemoryStorage {
  fn lock(
    &self,
  ) -> Result<std::sync::MutexGuard<'_, HashMap<String, CachedValue>>, StoreError> {
    self
      .entries
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, hash: &str) -> Result<Option<CachedValue>, StoreError> {
    Ok(self.lock()?.get(hash).cloned())
  }

  fn put(&self, hash: &str, value: Value) -> Result<(), StoreError> {
    self.lock()?.insert(
      hash.to_string(),
      CachedValue {
        value,
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn remove(&self, hash: &str) -> Result<(), StoreError> {
    self.lock()?.remove(hash);
    Ok(())
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _hash: &str) -> Result<Option<CachedValue>, StoreError> {
    Ok(None) // Always miss
  }

  fn put(&self, _hash: &str, _value: Value) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  fn remove(&self, _hash: &str) -> Result<(), StoreError> {
    Ok(())
  }
}
