//! Core traits for the request-keyed cache.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity within its collection.
  fn cache_key(&self) -> String;

  /// Entity type name for storage organization (e.g. "task", "project").
  fn entity_type() -> &'static str;
}

/// A request key identifying a cached collection or single-entity read.
pub trait QueryKey {
  /// Stable, fixed-length hash used as the storage key.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging.
  fn description(&self) -> String;
}
