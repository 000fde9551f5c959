//! SQLite-backed store for durable local data.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

use super::StoreBackend;

/// Schema for the key-value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Durable key-value backend over a single SQLite table.
pub struct SqliteBackend {
  conn: Mutex<Connection>,
}

impl SqliteBackend {
  /// Open or create the database at the default location
  /// (`<data dir>/taskdeck/data.db`).
  pub fn open() -> Result<Self, StoreError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| StoreError::Backend(format!("failed to create data directory: {e}")))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StoreError::Backend(format!("failed to open database at {}: {e}", path.display()))
    })?;

    let backend = Self {
      conn: Mutex::new(conn),
    };
    backend.run_migrations()?;

    Ok(backend)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Backend("could not determine data directory".to_string()))?;

    Ok(data_dir.join("taskdeck").join("data.db"))
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute_batch(KV_SCHEMA)?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    self
      .conn
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
  }
}

impl StoreBackend for SqliteBackend {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let conn = self.lock()?;
    let payload = conn
      .query_row(
        "SELECT payload FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(payload)
  }

  fn put(&self, key: &str, payload: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_store (key, payload, written_at)
       VALUES (?, ?, datetime('now'))",
      params![key, payload],
    )?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn put_get_remove_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::open_at(&dir.path().join("data.db")).unwrap();

    assert_eq!(backend.get("tasks_data").unwrap(), None);

    backend.put("tasks_data", "[]").unwrap();
    assert_eq!(backend.get("tasks_data").unwrap().as_deref(), Some("[]"));

    backend.put("tasks_data", r#"[{"id":"a"}]"#).unwrap();
    assert_eq!(
      backend.get("tasks_data").unwrap().as_deref(),
      Some(r#"[{"id":"a"}]"#)
    );

    backend.remove("tasks_data").unwrap();
    assert_eq!(backend.get("tasks_data").unwrap(), None);
  }

  #[test]
  fn reopening_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    {
      let backend = SqliteBackend::open_at(&path).unwrap();
      backend.put("projects_data", r#"["p"]"#).unwrap();
    }

    let backend = SqliteBackend::open_at(&path).unwrap();
    assert_eq!(
      backend.get("projects_data").unwrap().as_deref(),
      Some(r#"["p"]"#)
    );
  }
}
