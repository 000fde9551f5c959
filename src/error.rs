//! Error taxonomy for the storage, repository and auth layers.
//!
//! Errors are explicit values returned to the caller; nothing in this crate
//! logs-and-swallows a failure except the corrupt-payload case documented on
//! [`crate::store::LocalStore::load`].

use thiserror::Error;

/// Failures originating in the local store.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The underlying key-value backend failed (I/O, sqlite, poisoned lock).
  #[error("storage backend error: {0}")]
  Backend(String),

  /// A collection could not be serialized for writing.
  #[error("serialization error: {0}")]
  Serialize(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
  fn from(value: rusqlite::Error) -> Self {
    Self::Backend(value.to_string())
  }
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Store(#[from] StoreError),

  /// Lookup by id found nothing where an entity was required.
  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  /// Login with an unknown email.
  #[error("invalid credentials")]
  InvalidCredentials,

  /// Registration with an email that is already taken.
  #[error("user already exists: {0}")]
  UserExists(String),

  #[error("config error: {0}")]
  Config(String),
}

impl Error {
  /// Shorthand for a not-found error with an owned id.
  pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound {
      kind,
      id: id.into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
