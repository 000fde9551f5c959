//! Task repository.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Task, TaskDraft, TaskPatch};
use crate::store::{LocalStore, TASKS_KEY};

use super::{EntityCollection, Record};

impl Record for Task {
  fn id(&self) -> &str {
    &self.id
  }

  fn collection_key() -> &'static str {
    TASKS_KEY
  }

  fn kind() -> &'static str {
    "task"
  }
}

/// CRUD operations for tasks, plus completion toggling.
#[derive(Clone)]
pub struct TaskRepository {
  inner: EntityCollection<Task>,
}

impl TaskRepository {
  pub fn new(store: LocalStore, latency: Duration) -> Self {
    Self {
      inner: EntityCollection::new(store, latency),
    }
  }

  pub async fn list(&self) -> Result<Vec<Task>> {
    self.inner.list().await
  }

  /// Tasks referencing the given project.
  pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<Task>> {
    let tasks = self.inner.list().await?;
    Ok(
      tasks
        .into_iter()
        .filter(|task| task.project_id.as_deref() == Some(project_id))
        .collect(),
    )
  }

  pub async fn get_by_id(&self, id: &str) -> Result<Option<Task>> {
    self.inner.get_by_id(id).await
  }

  /// Fetch a task, failing with [`crate::Error::NotFound`] when absent.
  pub async fn require(&self, id: &str) -> Result<Task> {
    self.inner.require(id).await
  }

  /// Create a task from a draft. Id and creation timestamp are assigned
  /// here.
  pub async fn create(&self, draft: TaskDraft) -> Result<Task> {
    let task = Task {
      id: Uuid::new_v4().to_string(),
      title: draft.title,
      description: draft.description,
      completed: draft.completed,
      priority: draft.priority,
      due_date: draft.due_date,
      project_id: draft.project_id,
      created_at: Utc::now(),
    };

    debug!(id = %task.id, title = %task.title, "creating task");
    self.inner.insert(task).await
  }

  /// Apply a patch to the task matching `id`. Unknown ids leave the
  /// collection unchanged and return `None`.
  pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
    self.inner.modify(id, |task| patch.apply(task)).await
  }

  /// Delete a task; `false` when no task had that id.
  pub async fn delete(&self, id: &str) -> Result<bool> {
    debug!(id, "deleting task");
    self.inner.remove(id).await
  }

  /// Flip `completed` on the matching task. Calling twice restores the
  /// original state.
  pub async fn toggle_completion(&self, id: &str) -> Result<Option<Task>> {
    self
      .inner
      .modify(id, |task| task.completed = !task.completed)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::model::Priority;
  use crate::store::MemoryBackend;

  fn repo() -> TaskRepository {
    TaskRepository::new(LocalStore::new(MemoryBackend::default()), Duration::ZERO)
  }

  fn draft(title: &str) -> TaskDraft {
    TaskDraft {
      title: title.to_string(),
      priority: Priority::High,
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn create_assigns_id_and_timestamp() {
    let repo = repo();

    let before = Utc::now();
    let task = repo.create(draft("Write report")).await.unwrap();
    let after = Utc::now();

    assert!(!task.id.is_empty());
    assert!(task.created_at >= before && task.created_at <= after);
    assert_eq!(task.title, "Write report");
    assert_eq!(task.priority, Priority::High);

    let other = repo.create(draft("Another")).await.unwrap();
    assert_ne!(task.id, other.id);
  }

  #[tokio::test]
  async fn update_with_unknown_id_is_a_silent_no_op() {
    let repo = repo();
    let task = repo.create(draft("Keep me")).await.unwrap();

    let patch = TaskPatch {
      title: Some("Ghost".to_string()),
      ..Default::default()
    };
    let result = repo.update("no-such-id", patch).await.unwrap();

    assert_eq!(result, None);
    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks, vec![task]);
  }

  #[tokio::test]
  async fn update_patches_only_the_matching_task() {
    let repo = repo();
    let a = repo.create(draft("A")).await.unwrap();
    let b = repo.create(draft("B")).await.unwrap();

    let patch = TaskPatch {
      title: Some("A renamed".to_string()),
      completed: Some(true),
      ..Default::default()
    };
    let updated = repo.update(&a.id, patch).await.unwrap().unwrap();

    assert_eq!(updated.id, a.id);
    assert_eq!(updated.title, "A renamed");
    assert!(updated.completed);
    assert_eq!(updated.created_at, a.created_at);

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1], b);
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let repo = repo();
    let task = repo.create(draft("Doomed")).await.unwrap();

    assert!(repo.delete(&task.id).await.unwrap());
    let after_first = repo.list().await.unwrap();

    assert!(!repo.delete(&task.id).await.unwrap());
    let after_second = repo.list().await.unwrap();

    assert!(after_first.is_empty());
    assert_eq!(after_first, after_second);
  }

  #[tokio::test]
  async fn toggle_is_its_own_inverse() {
    let repo = repo();
    let task = repo.create(draft("Flip me")).await.unwrap();
    assert!(!task.completed);

    let once = repo.toggle_completion(&task.id).await.unwrap().unwrap();
    assert!(once.completed);

    let twice = repo.toggle_completion(&task.id).await.unwrap().unwrap();
    assert!(!twice.completed);

    assert_eq!(
      repo.toggle_completion("missing").await.unwrap(),
      None
    );
  }

  #[tokio::test]
  async fn require_reports_not_found() {
    let repo = repo();

    let err = repo.require("nope").await.unwrap_err();
    match err {
      Error::NotFound { kind, id } => {
        assert_eq!(kind, "task");
        assert_eq!(id, "nope");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn list_by_project_filters_on_the_foreign_key() {
    let repo = repo();
    let mut d = draft("In project");
    d.project_id = Some("p1".to_string());
    let in_project = repo.create(d).await.unwrap();
    repo.create(draft("Loose")).await.unwrap();

    let tasks = repo.list_by_project("p1").await.unwrap();
    assert_eq!(tasks, vec![in_project]);
  }
}
