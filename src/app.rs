//! Intent-driven application controller.
//!
//! The controller owns the repositories, the read-through cache and the
//! normalized [`AppState`]. User intents (create, edit, toggle, delete,
//! select, open/close dialog) spawn repository calls; each completed call
//! patches the cache optimistically and emits an [`AppEvent`] over an
//! unbounded channel. The owning loop drains events with
//! [`App::next_event`] / [`App::tick`] and folds them into state, after
//! which a front end re-renders from accessors. Repository failures become
//! `AppEvent::Error` and land in the collection's error slot - nothing is
//! swallowed.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::cache::{CacheLayer, CollectionKey, MemoryStorage};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forms::{ProjectForm, TaskForm, ValidationErrors};
use crate::model::{Project, ProjectPatch, Task, TaskFilter, TaskPatch, TaskWithProject};
use crate::repo::{ProjectRepository, TaskRepository};
use crate::seed;
use crate::state::{Action, AppState};
use crate::store::{LocalStore, MemoryBackend, SqliteBackend};

/// Which collection an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Tasks,
  Projects,
}

/// Events emitted by completed repository calls.
#[derive(Debug, Clone)]
pub enum AppEvent {
  TasksLoaded(Vec<Task>),
  TaskCreated(Task),
  TaskUpdated(Task),
  TaskToggled(Task),
  TaskDeleted(String),
  TaskSelected(Task),

  ProjectsLoaded(Vec<Project>),
  ProjectCreated(Project),
  ProjectUpdated(Project),
  ProjectDeleted(String),
  ProjectSelected(Project),

  Error { scope: Scope, message: String },
}

/// Application controller: state + repositories + cache + event channel.
pub struct App {
  state: AppState,
  tasks: TaskRepository,
  projects: ProjectRepository,
  cache: CacheLayer<MemoryStorage>,
  event_tx: mpsc::UnboundedSender<AppEvent>,
  event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
  /// Build an app over the durable sqlite store.
  pub fn new(config: &Config) -> Result<Self> {
    let backend = match &config.storage.path {
      Some(path) => SqliteBackend::open_at(path)?,
      None => SqliteBackend::open()?,
    };
    Self::with_store(LocalStore::new(backend), config)
  }

  /// Build an app over an in-memory store (tests, ephemeral sessions).
  pub fn in_memory(config: &Config) -> Result<Self> {
    Self::with_store(LocalStore::new(MemoryBackend::default()), config)
  }

  /// Build an app over an explicitly injected store.
  pub fn with_store(store: LocalStore, config: &Config) -> Result<Self> {
    if config.seed_sample_data {
      seed::ensure_sample_data(&store)?;
    }

    let latency = config.latency();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    Ok(Self {
      state: AppState::default(),
      tasks: TaskRepository::new(store.clone(), latency),
      projects: ProjectRepository::new(store, latency),
      cache: CacheLayer::new(MemoryStorage::default()),
      event_tx,
      event_rx,
    })
  }

  pub fn state(&self) -> &AppState {
    &self.state
  }

  /// Receive the next event. `None` only when every sender is gone.
  pub async fn next_event(&mut self) -> Option<AppEvent> {
    self.event_rx.recv().await
  }

  /// Receive and fold one event; `false` when the channel is closed.
  pub async fn tick(&mut self) -> bool {
    match self.next_event().await {
      Some(event) => {
        self.handle_event(event);
        true
      }
      None => false,
    }
  }

  /// Fold a completed repository call into the normalized state.
  pub fn handle_event(&mut self, event: AppEvent) {
    match event {
      AppEvent::TasksLoaded(tasks) => self.state.reduce(Action::TasksFetchSuccess(tasks)),
      AppEvent::TaskCreated(task) => {
        self.state.reduce(Action::TaskAdded(task));
        self.state.reduce(Action::TaskDialogClosed);
      }
      AppEvent::TaskUpdated(task) => {
        self.state.reduce(Action::TaskUpdated(task));
        self.state.reduce(Action::TaskDialogClosed);
      }
      AppEvent::TaskToggled(task) => self.state.reduce(Action::TaskUpdated(task)),
      AppEvent::TaskDeleted(id) => self.state.reduce(Action::TaskDeleted(id)),
      AppEvent::TaskSelected(task) => self.state.reduce(Action::TaskSelected(task)),

      AppEvent::ProjectsLoaded(projects) => {
        self.state.reduce(Action::ProjectsFetchSuccess(projects))
      }
      AppEvent::ProjectCreated(project) => {
        self.state.reduce(Action::ProjectAdded(project));
        self.state.reduce(Action::ProjectDialogClosed);
      }
      AppEvent::ProjectUpdated(project) => {
        self.state.reduce(Action::ProjectUpdated(project));
        self.state.reduce(Action::ProjectDialogClosed);
      }
      AppEvent::ProjectDeleted(id) => {
        self.state.reduce(Action::ProjectDeleted(id.clone()));
        self.state.reduce(Action::ProjectTasksCleared(id));
      }
      AppEvent::ProjectSelected(project) => self.state.reduce(Action::ProjectSelected(project)),

      AppEvent::Error { scope, message } => match scope {
        Scope::Tasks => self.state.reduce(Action::TasksFetchFailure(message)),
        Scope::Projects => self.state.reduce(Action::ProjectsFetchFailure(message)),
      },
    }
  }

  // --------------------------------------------------------------------
  // Fetch intents
  // --------------------------------------------------------------------

  /// Load the task collection through the cache.
  pub fn load_tasks(&mut self) {
    self.state.reduce(Action::TasksFetchStart);
    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let fetch = {
        let repo = repo.clone();
        move || async move { repo.list().await }
      };
      let event = match cache.read(&CollectionKey::Tasks, fetch).await {
        Ok(tasks) => AppEvent::TasksLoaded(tasks),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });
  }

  /// Load the project collection through the cache.
  pub fn load_projects(&mut self) {
    self.state.reduce(Action::ProjectsFetchStart);
    let repo = self.projects.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let fetch = {
        let repo = repo.clone();
        move || async move { repo.list().await }
      };
      let event = match cache.read(&CollectionKey::Projects, fetch).await {
        Ok(projects) => AppEvent::ProjectsLoaded(projects),
        Err(e) => error_event(Scope::Projects, e),
      };
      let _ = tx.send(event);
    });
  }

  /// Load both collections concurrently; the task list view needs the
  /// projects anyway for its name join.
  pub fn load_all(&mut self) {
    self.state.reduce(Action::TasksFetchStart);
    self.state.reduce(Action::ProjectsFetchStart);
    let tasks = self.tasks.clone();
    let projects = self.projects.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let task_fetch = {
        let repo = tasks.clone();
        move || async move { repo.list().await }
      };
      let project_fetch = {
        let repo = projects.clone();
        move || async move { repo.list().await }
      };

      let joined = futures::future::try_join(
        cache.read(&CollectionKey::Tasks, task_fetch),
        cache.read(&CollectionKey::Projects, project_fetch),
      )
      .await;

      match joined {
        Ok((tasks, projects)) => {
          let _ = tx.send(AppEvent::TasksLoaded(tasks));
          let _ = tx.send(AppEvent::ProjectsLoaded(projects));
        }
        Err(e) => {
          // Fail both slices; leaving one in Loading would wedge it
          let message = e.to_string();
          let _ = tx.send(AppEvent::Error {
            scope: Scope::Tasks,
            message: message.clone(),
          });
          let _ = tx.send(AppEvent::Error {
            scope: Scope::Projects,
            message,
          });
        }
      }
    });
  }

  // --------------------------------------------------------------------
  // Task intents
  // --------------------------------------------------------------------

  /// Validate the dialog form and create a task. Validation failures are
  /// returned for inline display; nothing is dispatched.
  pub fn create_task(&mut self, form: &TaskForm) -> std::result::Result<(), ValidationErrors> {
    let draft = form.validate()?;
    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let created = repo.create(draft).await?;
        let list = {
          let repo = repo.clone();
          move || async move { repo.list().await }
        };
        let appended = created.clone();
        cache
          .mutate(
            &CollectionKey::Tasks,
            move |mut tasks: Vec<Task>| {
              tasks.push(appended);
              tasks
            },
            false,
            list,
          )
          .await?;
        Ok::<_, Error>(created)
      }
      .await;

      let event = match result {
        Ok(task) => AppEvent::TaskCreated(task),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });

    Ok(())
  }

  /// Validate the dialog form and update every mutable field of a task.
  pub fn update_task(
    &mut self,
    id: String,
    form: &TaskForm,
  ) -> std::result::Result<(), ValidationErrors> {
    let draft = form.validate()?;
    let patch = TaskPatch {
      title: Some(draft.title),
      description: Some(draft.description),
      completed: Some(draft.completed),
      priority: Some(draft.priority),
      due_date: Some(draft.due_date),
      project_id: Some(draft.project_id),
    };

    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let updated = repo
          .update(&id, patch)
          .await?
          .ok_or_else(|| Error::not_found("task", id.clone()))?;
        patch_task_cache(&cache, &repo, updated.clone()).await?;
        Ok::<_, Error>(updated)
      }
      .await;

      let event = match result {
        Ok(task) => AppEvent::TaskUpdated(task),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });

    Ok(())
  }

  /// Flip a task's completion state.
  pub fn toggle_task(&mut self, id: String) {
    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let toggled = repo
          .toggle_completion(&id)
          .await?
          .ok_or_else(|| Error::not_found("task", id.clone()))?;
        patch_task_cache(&cache, &repo, toggled.clone()).await?;
        Ok::<_, Error>(toggled)
      }
      .await;

      let event = match result {
        Ok(task) => AppEvent::TaskToggled(task),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });
  }

  /// Delete a task. Deleting an already-deleted id still settles cleanly.
  pub fn delete_task(&mut self, id: String) {
    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        repo.delete(&id).await?;
        let list = {
          let repo = repo.clone();
          move || async move { repo.list().await }
        };
        let removed = id.clone();
        cache
          .mutate(
            &CollectionKey::Tasks,
            move |mut tasks: Vec<Task>| {
              tasks.retain(|t| t.id != removed);
              tasks
            },
            false,
            list,
          )
          .await?;
        cache.set_one::<Task, _>(&CollectionKey::Task { id: id.clone() }, None)?;
        Ok::<_, Error>(id)
      }
      .await;

      let event = match result {
        Ok(id) => AppEvent::TaskDeleted(id),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });
  }

  /// Focus a task for a detail view; absent ids surface as errors.
  pub fn select_task(&mut self, id: String) {
    let repo = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let key = CollectionKey::Task { id: id.clone() };
      let fetch = {
        let repo = repo.clone();
        let id = id.clone();
        move || async move { repo.get_by_id(&id).await }
      };
      let result = async {
        cache
          .read_one(&key, fetch)
          .await?
          .ok_or_else(|| Error::not_found("task", id))
      }
      .await;

      let event = match result {
        Ok(task) => AppEvent::TaskSelected(task),
        Err(e) => error_event(Scope::Tasks, e),
      };
      let _ = tx.send(event);
    });
  }

  pub fn clear_task_selection(&mut self) {
    self.state.reduce(Action::TaskSelectionCleared);
  }

  // --------------------------------------------------------------------
  // Project intents
  // --------------------------------------------------------------------

  pub fn create_project(&mut self, form: &ProjectForm) -> std::result::Result<(), ValidationErrors> {
    let draft = form.validate()?;
    let repo = self.projects.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let created = repo.create(draft).await?;
        let list = {
          let repo = repo.clone();
          move || async move { repo.list().await }
        };
        let appended = created.clone();
        cache
          .mutate(
            &CollectionKey::Projects,
            move |mut projects: Vec<Project>| {
              projects.push(appended);
              projects
            },
            false,
            list,
          )
          .await?;
        Ok::<_, Error>(created)
      }
      .await;

      let event = match result {
        Ok(project) => AppEvent::ProjectCreated(project),
        Err(e) => error_event(Scope::Projects, e),
      };
      let _ = tx.send(event);
    });

    Ok(())
  }

  pub fn update_project(
    &mut self,
    id: String,
    form: &ProjectForm,
  ) -> std::result::Result<(), ValidationErrors> {
    let draft = form.validate()?;
    let patch = ProjectPatch {
      name: Some(draft.name),
      color: Some(draft.color),
    };

    let repo = self.projects.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let updated = repo
          .update(&id, patch)
          .await?
          .ok_or_else(|| Error::not_found("project", id.clone()))?;

        let list = {
          let repo = repo.clone();
          move || async move { repo.list().await }
        };
        let replacement = updated.clone();
        cache
          .mutate(
            &CollectionKey::Projects,
            move |mut projects: Vec<Project>| {
              if let Some(slot) = projects.iter_mut().find(|p| p.id == replacement.id) {
                *slot = replacement;
              }
              projects
            },
            false,
            list,
          )
          .await?;
        cache.set_one(
          &CollectionKey::Project {
            id: updated.id.clone(),
          },
          Some(&updated),
        )?;
        Ok::<_, Error>(updated)
      }
      .await;

      let event = match result {
        Ok(project) => AppEvent::ProjectUpdated(project),
        Err(e) => error_event(Scope::Projects, e),
      };
      let _ = tx.send(event);
    });

    Ok(())
  }

  /// Delete a project; its tasks are cascade-deleted by the repository and
  /// the cached task collection is pruned to match.
  pub fn delete_project(&mut self, id: String) {
    let projects = self.projects.clone();
    let tasks = self.tasks.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        projects.delete(&id).await?;

        let project_list = {
          let repo = projects.clone();
          move || async move { repo.list().await }
        };
        let removed = id.clone();
        cache
          .mutate(
            &CollectionKey::Projects,
            move |mut projects: Vec<Project>| {
              projects.retain(|p| p.id != removed);
              projects
            },
            false,
            project_list,
          )
          .await?;

        let task_list = {
          let repo = tasks.clone();
          move || async move { repo.list().await }
        };
        let removed = id.clone();
        cache
          .mutate(
            &CollectionKey::Tasks,
            move |mut tasks: Vec<Task>| {
              tasks.retain(|t| t.project_id.as_deref() != Some(removed.as_str()));
              tasks
            },
            false,
            task_list,
          )
          .await?;

        cache.set_one::<Project, _>(&CollectionKey::Project { id: id.clone() }, None)?;
        Ok::<_, Error>(id)
      }
      .await;

      let event = match result {
        Ok(id) => AppEvent::ProjectDeleted(id),
        Err(e) => error_event(Scope::Projects, e),
      };
      let _ = tx.send(event);
    });
  }

  pub fn select_project(&mut self, id: String) {
    let repo = self.projects.clone();
    let cache = self.cache.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let key = CollectionKey::Project { id: id.clone() };
      let fetch = {
        let repo = repo.clone();
        let id = id.clone();
        move || async move { repo.get_by_id(&id).await }
      };
      let result = async {
        cache
          .read_one(&key, fetch)
          .await?
          .ok_or_else(|| Error::not_found("project", id))
      }
      .await;

      let event = match result {
        Ok(project) => AppEvent::ProjectSelected(project),
        Err(e) => error_event(Scope::Projects, e),
      };
      let _ = tx.send(event);
    });
  }

  pub fn clear_project_selection(&mut self) {
    self.state.reduce(Action::ProjectSelectionCleared);
  }

  // --------------------------------------------------------------------
  // Dialog intents
  // --------------------------------------------------------------------

  pub fn open_task_dialog(&mut self) {
    self.state.reduce(Action::TaskDialogOpened);
  }

  pub fn close_task_dialog(&mut self) {
    self.state.reduce(Action::TaskDialogClosed);
  }

  pub fn open_project_dialog(&mut self) {
    self.state.reduce(Action::ProjectDialogOpened);
  }

  pub fn close_project_dialog(&mut self) {
    self.state.reduce(Action::ProjectDialogClosed);
  }

  // --------------------------------------------------------------------
  // Derived views (recomputed on every call, never cached)
  // --------------------------------------------------------------------

  /// Tasks joined with their project's display name.
  pub fn tasks_with_project_names(&self) -> Vec<TaskWithProject> {
    self
      .state
      .tasks
      .items
      .iter()
      .map(|task| {
        let project_name = task.project_id.as_deref().and_then(|pid| {
          self
            .state
            .projects
            .items
            .iter()
            .find(|p| p.id == pid)
            .map(|p| p.name.clone())
        });
        TaskWithProject {
          task: task.clone(),
          project_name,
        }
      })
      .collect()
  }

  /// Tasks passing the given filter relative to `now`.
  pub fn filtered_tasks(&self, filter: TaskFilter, now: DateTime<Utc>) -> Vec<&Task> {
    self
      .state
      .tasks
      .items
      .iter()
      .filter(|task| filter.matches(task, now))
      .collect()
  }
}

/// Whole days between `now` and a task's due date (calendar difference;
/// negative when overdue). `None` for tasks without a due date.
pub fn days_remaining(task: &Task, now: DateTime<Utc>) -> Option<i64> {
  task
    .due_date
    .map(|due| (due.date_naive() - now.date_naive()).num_days())
}

async fn patch_task_cache(
  cache: &CacheLayer<MemoryStorage>,
  repo: &TaskRepository,
  updated: Task,
) -> Result<()> {
  let list = {
    let repo = repo.clone();
    move || async move { repo.list().await }
  };
  let replacement = updated.clone();
  cache
    .mutate(
      &CollectionKey::Tasks,
      move |mut tasks: Vec<Task>| {
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == replacement.id) {
          *slot = replacement;
        }
        tasks
      },
      false,
      list,
    )
    .await?;
  cache.set_one(
    &CollectionKey::Task {
      id: updated.id.clone(),
    },
    Some(&updated),
  )?;
  Ok(())
}

fn error_event(scope: Scope, error: Error) -> AppEvent {
  AppEvent::Error {
    scope,
    message: error.to_string(),
  }
}
