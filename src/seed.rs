//! First-run sample data.

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Priority, Project, Task};
use crate::store::{LocalStore, PROJECTS_KEY, TASKS_KEY};

/// Seed sample projects and tasks into empty collections. Non-empty
/// collections are left untouched, so this is safe to call on every start.
/// Writes go straight to the store; no latency simulation applies.
pub fn ensure_sample_data(store: &LocalStore) -> Result<(), StoreError> {
  let projects: Vec<Project> = store.load(PROJECTS_KEY)?;
  let work_id = if projects.is_empty() {
    let samples = sample_projects();
    let work_id = samples[0].id.clone();
    store.save(PROJECTS_KEY, &samples)?;
    info!(count = samples.len(), "seeded sample projects");
    Some(work_id)
  } else {
    None
  };

  let tasks: Vec<Task> = store.load(TASKS_KEY)?;
  if tasks.is_empty() {
    let samples = sample_tasks(work_id.as_deref());
    store.save(TASKS_KEY, &samples)?;
    info!(count = samples.len(), "seeded sample tasks");
  }

  Ok(())
}

fn sample_projects() -> Vec<Project> {
  let now = Utc::now();
  [("Work", "#FF5733"), ("Personal", "#33FF57"), ("Study", "#3357FF")]
    .into_iter()
    .map(|(name, color)| Project {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      color: Some(color.to_string()),
      created_at: now,
    })
    .collect()
}

fn sample_tasks(project_id: Option<&str>) -> Vec<Task> {
  let now = Utc::now();
  let task = |title: &str, priority: Priority| Task {
    id: Uuid::new_v4().to_string(),
    title: title.to_string(),
    description: None,
    completed: false,
    priority,
    due_date: None,
    project_id: project_id.map(String::from),
    created_at: now,
  };

  let mut tasks = vec![
    task("Write the project brief", Priority::High),
    task("Review open tasks", Priority::Medium),
  ];
  let mut plan = task("Plan the next release", Priority::Low);
  plan.due_date = Some(now + Duration::days(7));
  tasks.push(plan);
  tasks
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryBackend;

  #[test]
  fn seeds_empty_collections_once() {
    let store = LocalStore::new(MemoryBackend::default());

    ensure_sample_data(&store).unwrap();
    let projects: Vec<Project> = store.load(PROJECTS_KEY).unwrap();
    let tasks: Vec<Task> = store.load(TASKS_KEY).unwrap();
    assert_eq!(projects.len(), 3);
    assert_eq!(tasks.len(), 3);
    assert_eq!(projects[0].name, "Work");

    // Sample tasks land in the first seeded project
    assert!(tasks
      .iter()
      .all(|t| t.project_id.as_deref() == Some(projects[0].id.as_str())));

    // Running again changes nothing
    ensure_sample_data(&store).unwrap();
    assert_eq!(store.load::<Project>(PROJECTS_KEY).unwrap(), projects);
    assert_eq!(store.load::<Task>(TASKS_KEY).unwrap(), tasks);
  }

  #[test]
  fn existing_data_is_never_overwritten() {
    let store = LocalStore::new(MemoryBackend::default());
    let existing = vec![Project {
      id: "mine".to_string(),
      name: "Custom".to_string(),
      color: None,
      created_at: Utc::now(),
    }];
    store.save(PROJECTS_KEY, &existing).unwrap();

    ensure_sample_data(&store).unwrap();

    assert_eq!(store.load::<Project>(PROJECTS_KEY).unwrap(), existing);
    // Tasks were still empty, so they get seeded without a project link
    let tasks: Vec<Task> = store.load(TASKS_KEY).unwrap();
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|t| t.project_id.is_none()));
  }
}
