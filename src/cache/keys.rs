//! Cache key types and `Cacheable` implementations for the core entities.

use sha2::{Digest, Sha256};

use crate::model::{Project, Task};

use super::traits::{Cacheable, QueryKey};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Task {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "task"
  }
}

impl Cacheable for Project {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "project"
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Request keys for the entity collections and single-entity reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionKey {
  /// The full task collection
  Tasks,
  /// The full project collection
  Projects,
  /// A single task by id
  Task { id: String },
  /// A single project by id
  Project { id: String },
}

impl QueryKey for CollectionKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Tasks => "tasks".to_string(),
      Self::Projects => "projects".to_string(),
      Self::Task { id } => format!("task:{id}"),
      Self::Project { id } => format!("project:{id}"),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::Tasks => "all tasks".to_string(),
      Self::Projects => "all projects".to_string(),
      Self::Task { id } => format!("task {id}"),
      Self::Project { id } => format!("project {id}"),
    }
  }
}
