//! In-memory store backend for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

use super::StoreBackend;

/// Volatile key-value backend. Nothing survives the process.
#[derive(Default)]
pub struct MemoryBackend {
  entries: Mutex<HashMap<String, String>>,
}

impl StoreBackend for MemoryBackend {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
    Ok(entries.get(key).cloned())
  }

  fn put(&self, key: &str, payload: &str) -> Result<(), StoreError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
    entries.insert(key.to_string(), payload.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
    entries.remove(key);
    Ok(())
  }
}
