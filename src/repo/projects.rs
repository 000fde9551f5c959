//! Project repository.
//!
//! Deleting a project cascade-deletes its tasks. The alternative (leaving
//! dangling `project_id` references) was considered and rejected; see
//! DESIGN.md.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Project, ProjectDraft, ProjectPatch, Task};
use crate::store::{LocalStore, PROJECTS_KEY, TASKS_KEY};

use super::{EntityCollection, Record};

impl Record for Project {
  fn id(&self) -> &str {
    &self.id
  }

  fn collection_key() -> &'static str {
    PROJECTS_KEY
  }

  fn kind() -> &'static str {
    "project"
  }
}

/// CRUD operations for projects.
#[derive(Clone)]
pub struct ProjectRepository {
  inner: EntityCollection<Project>,
}

impl ProjectRepository {
  pub fn new(store: LocalStore, latency: Duration) -> Self {
    Self {
      inner: EntityCollection::new(store, latency),
    }
  }

  pub async fn list(&self) -> Result<Vec<Project>> {
    self.inner.list().await
  }

  pub async fn get_by_id(&self, id: &str) -> Result<Option<Project>> {
    self.inner.get_by_id(id).await
  }

  /// Fetch a project, failing with [`crate::Error::NotFound`] when absent.
  pub async fn require(&self, id: &str) -> Result<Project> {
    self.inner.require(id).await
  }

  /// Create a project from a draft. Id and creation timestamp are assigned
  /// here.
  pub async fn create(&self, draft: ProjectDraft) -> Result<Project> {
    let project = Project {
      id: Uuid::new_v4().to_string(),
      name: draft.name,
      color: draft.color,
      created_at: Utc::now(),
    };

    debug!(id = %project.id, name = %project.name, "creating project");
    self.inner.insert(project).await
  }

  /// Apply a patch to the project matching `id`. Unknown ids leave the
  /// collection unchanged and return `None`.
  pub async fn update(&self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
    self.inner.modify(id, |project| patch.apply(project)).await
  }

  /// Delete a project and every task referencing it. Idempotent; when the
  /// project is absent nothing is touched, tasks included.
  pub async fn delete(&self, id: &str) -> Result<bool> {
    let removed = self.inner.remove(id).await?;
    if !removed {
      return Ok(false);
    }

    let store = self.inner.store();
    let mut tasks: Vec<Task> = store.load(TASKS_KEY)?;
    let before = tasks.len();
    tasks.retain(|task| task.project_id.as_deref() != Some(id));

    if tasks.len() != before {
      debug!(
        project_id = id,
        cascaded = before - tasks.len(),
        "cascade-deleting project tasks"
      );
      store.save(TASKS_KEY, &tasks)?;
    }

    Ok(true)
  }
}
