//! Normalized state container: canonical in-memory copies of the entity
//! collections plus transient dialog flags, updated only through named
//! [`Action`]s folded in by a pure reducer. No I/O happens here; the
//! intent layer performs repository calls and dispatches the results.

use crate::model::{Project, Task};

/// Load lifecycle of a collection: `Idle -> Loading -> (Loaded | Failed)`,
/// returning to `Loading` on the next fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
  #[default]
  Idle,
  Loading,
  Loaded,
  Failed,
}

impl LoadState {
  pub fn is_loading(&self) -> bool {
    matches!(self, Self::Loading)
  }
}

/// State slice for one entity collection.
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
  pub items: Vec<T>,
  /// The entity currently focused in detail views, if any.
  pub current: Option<T>,
  pub load: LoadState,
  pub error: Option<String>,
}

// Manual impl: `derive` would require `T: Default`
impl<T> Default for CollectionState<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      current: None,
      load: LoadState::default(),
      error: None,
    }
  }
}

impl<T> CollectionState<T> {
  /// Entering `Loading` always clears a previous error.
  fn fetch_start(&mut self) {
    self.load = LoadState::Loading;
    self.error = None;
  }

  fn fetch_success(&mut self, items: Vec<T>) {
    self.load = LoadState::Loaded;
    self.items = items;
  }

  fn fetch_failure(&mut self, message: String) {
    self.load = LoadState::Failed;
    self.error = Some(message);
  }
}

/// Transient dialog visibility flags. Never persisted; reset on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialogState {
  pub task_dialog_open: bool,
  pub project_dialog_open: bool,
}

/// Named state transitions. Every mutation of [`AppState`] goes through one
/// of these.
#[derive(Debug, Clone)]
pub enum Action {
  TasksFetchStart,
  TasksFetchSuccess(Vec<Task>),
  TasksFetchFailure(String),
  TaskAdded(Task),
  /// Replace the task with the same id; unknown ids are a no-op, nothing
  /// is inserted.
  TaskUpdated(Task),
  TaskDeleted(String),
  TaskSelected(Task),
  TaskSelectionCleared,

  ProjectsFetchStart,
  ProjectsFetchSuccess(Vec<Project>),
  ProjectsFetchFailure(String),
  ProjectAdded(Project),
  ProjectUpdated(Project),
  ProjectDeleted(String),
  ProjectSelected(Project),
  ProjectSelectionCleared,
  /// Drop every task referencing a project (cascade echo after a project
  /// deletion).
  ProjectTasksCleared(String),

  TaskDialogOpened,
  TaskDialogClosed,
  ProjectDialogOpened,
  ProjectDialogClosed,
}

/// The full normalized application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
  pub tasks: CollectionState<Task>,
  pub projects: CollectionState<Project>,
  pub dialogs: DialogState,
}

impl AppState {
  /// Fold an action into the state. Pure: no I/O, no side effects.
  pub fn reduce(&mut self, action: Action) {
    match action {
      Action::TasksFetchStart => self.tasks.fetch_start(),
      Action::TasksFetchSuccess(tasks) => self.tasks.fetch_success(tasks),
      Action::TasksFetchFailure(message) => self.tasks.fetch_failure(message),
      Action::TaskAdded(task) => self.tasks.items.push(task),
      Action::TaskUpdated(task) => {
        if let Some(slot) = self.tasks.items.iter_mut().find(|t| t.id == task.id) {
          *slot = task.clone();
        }
        if self.tasks.current.as_ref().is_some_and(|c| c.id == task.id) {
          self.tasks.current = Some(task);
        }
      }
      Action::TaskDeleted(id) => {
        self.tasks.items.retain(|t| t.id != id);
        if self.tasks.current.as_ref().is_some_and(|c| c.id == id) {
          self.tasks.current = None;
        }
      }
      Action::TaskSelected(task) => self.tasks.current = Some(task),
      Action::TaskSelectionCleared => self.tasks.current = None,

      Action::ProjectsFetchStart => self.projects.fetch_start(),
      Action::ProjectsFetchSuccess(projects) => self.projects.fetch_success(projects),
      Action::ProjectsFetchFailure(message) => self.projects.fetch_failure(message),
      Action::ProjectAdded(project) => self.projects.items.push(project),
      Action::ProjectUpdated(project) => {
        if let Some(slot) = self.projects.items.iter_mut().find(|p| p.id == project.id) {
          *slot = project.clone();
        }
        if self
          .projects
          .current
          .as_ref()
          .is_some_and(|c| c.id == project.id)
        {
          self.projects.current = Some(project);
        }
      }
      Action::ProjectDeleted(id) => {
        self.projects.items.retain(|p| p.id != id);
        if self.projects.current.as_ref().is_some_and(|c| c.id == id) {
          self.projects.current = None;
        }
      }
      Action::ProjectSelected(project) => self.projects.current = Some(project),
      Action::ProjectSelectionCleared => self.projects.current = None,
      Action::ProjectTasksCleared(project_id) => {
        self
          .tasks
          .items
          .retain(|t| t.project_id.as_deref() != Some(project_id.as_str()));
        if self
          .tasks
          .current
          .as_ref()
          .is_some_and(|c| c.project_id.as_deref() == Some(project_id.as_str()))
        {
          self.tasks.current = None;
        }
      }

      Action::TaskDialogOpened => self.dialogs.task_dialog_open = true,
      Action::TaskDialogClosed => self.dialogs.task_dialog_open = false,
      Action::ProjectDialogOpened => self.dialogs.project_dialog_open = true,
      Action::ProjectDialogClosed => self.dialogs.project_dialog_open = false,
    }
  }
}
