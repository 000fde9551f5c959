//! Key-value persistence shim holding the serialized entity collections.
//!
//! Each collection lives under a fixed string key as a JSON array. The
//! backend is injected explicitly (no module-level shared state), so tests
//! run against [`MemoryBackend`] and production code against
//! [`SqliteBackend`]. Concurrent writers are last-write-wins; there is no
//! cross-process coordination.

mod memory;
mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;

/// Collection key for tasks.
pub const TASKS_KEY: &str = "tasks_data";
/// Collection key for projects.
pub const PROJECTS_KEY: &str = "projects_data";
/// Collection key for registered users.
pub const USERS_KEY: &str = "users_data";
/// Raw (non-collection) key holding the current session token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Backend trait for durable key-value storage.
pub trait StoreBackend: Send + Sync {
  /// Read the raw payload stored under a key, if any.
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Write a raw payload under a key, replacing any previous value.
  fn put(&self, key: &str, payload: &str) -> Result<(), StoreError>;

  /// Remove a key. Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed facade over a [`StoreBackend`], serializing collections as JSON.
#[derive(Clone)]
pub struct LocalStore {
  backend: Arc<dyn StoreBackend>,
}

impl LocalStore {
  pub fn new(backend: impl StoreBackend + 'static) -> Self {
    Self {
      backend: Arc::new(backend),
    }
  }

  /// Load a collection. An absent key reads as an empty collection. A
  /// payload that no longer parses is logged and also read as empty, so a
  /// corrupt store never wedges the application; backend failures are
  /// returned to the caller.
  pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
    match self.backend.get(key)? {
      None => Ok(Vec::new()),
      Some(payload) => match serde_json::from_str(&payload) {
        Ok(items) => Ok(items),
        Err(error) => {
          warn!(key, %error, "corrupt payload, treating collection as empty");
          Ok(Vec::new())
        }
      },
    }
  }

  /// Serialize and write a collection under its key.
  pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
    let payload = serde_json::to_string(items)?;
    self.backend.put(key, &payload)
  }

  /// Read a raw string value (e.g. the session token).
  pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
    self.backend.get(key)
  }

  /// Write a raw string value.
  pub fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
    self.backend.put(key, value)
  }

  /// Remove a key entirely.
  pub fn remove(&self, key: &str) -> Result<(), StoreError> {
    self.backend.remove(key)
  }
}
