//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_LATENCY_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub storage: StorageConfig,

  /// Simulated latency per repository operation, in milliseconds. Zero
  /// disables the delay (tests run this way).
  #[serde(default = "default_latency_ms")]
  pub latency_ms: u64,

  /// Write sample projects/tasks on first run when the store is empty.
  #[serde(default)]
  pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Database path; defaults to `<data dir>/taskdeck/data.db`.
  pub path: Option<PathBuf>,
}

fn default_latency_ms() -> u64 {
  DEFAULT_LATENCY_MS
}

impl Default for Config {
  fn default() -> Self {
    Self {
      storage: StorageConfig::default(),
      latency_ms: DEFAULT_LATENCY_MS,
      seed_sample_data: false,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./taskdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/taskdeck/config.yaml
  ///
  /// With no file anywhere, defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("taskdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("taskdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      Error::Config(format!("failed to read config file {}: {e}", path.display()))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
      Error::Config(format!(
        "failed to parse config file {}: {e}",
        path.display()
      ))
    })
  }

  /// The simulated latency as a [`Duration`].
  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.latency_ms)
  }
}
