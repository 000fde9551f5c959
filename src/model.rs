//! Core entity types shared by the storage, cache, state and view layers.
//!
//! Serialized field names are camelCase to match the persisted collection
//! layout (a JSON array per collection key).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  /// Parse a priority from its lowercase name.
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "low" => Some(Self::Low),
      "medium" => Some(Self::Medium),
      "high" => Some(Self::High),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

/// A single task. The id is assigned on creation and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub completed: bool,
  pub priority: Priority,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub due_date: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A project grouping tasks. `color` is a display hint (e.g. "#FF5733").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A registered user, for the simulated auth flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
}

/// Caller-supplied fields for creating a task. The repository assigns the
/// id and creation timestamp.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
  pub title: String,
  pub description: Option<String>,
  pub completed: bool,
  pub priority: Priority,
  pub due_date: Option<DateTime<Utc>>,
  pub project_id: Option<String>,
}

/// Caller-supplied fields for creating a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
  pub name: String,
  pub color: Option<String>,
}

/// Explicit update struct for tasks, listing exactly the mutable fields.
///
/// Optional entity fields use a two-level `Option` so "leave unchanged"
/// (`None`) and "clear the field" (`Some(None)`) stay distinct. `id` and
/// `created_at` are not patchable.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
  pub title: Option<String>,
  pub description: Option<Option<String>>,
  pub completed: Option<bool>,
  pub priority: Option<Priority>,
  pub due_date: Option<Option<DateTime<Utc>>>,
  pub project_id: Option<Option<String>>,
}

impl TaskPatch {
  /// Apply this patch to a task in place.
  pub fn apply(self, task: &mut Task) {
    if let Some(title) = self.title {
      task.title = title;
    }
    if let Some(description) = self.description {
      task.description = description;
    }
    if let Some(completed) = self.completed {
      task.completed = completed;
    }
    if let Some(priority) = self.priority {
      task.priority = priority;
    }
    if let Some(due_date) = self.due_date {
      task.due_date = due_date;
    }
    if let Some(project_id) = self.project_id {
      task.project_id = project_id;
    }
  }
}

/// Explicit update struct for projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
  pub name: Option<String>,
  pub color: Option<Option<String>>,
}

impl ProjectPatch {
  /// Apply this patch to a project in place.
  pub fn apply(self, project: &mut Project) {
    if let Some(name) = self.name {
      project.name = name;
    }
    if let Some(color) = self.color {
      project.color = color;
    }
  }
}

/// List filters for task views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
  #[default]
  All,
  Completed,
  Active,
  /// Due today (calendar date of `now`).
  Today,
  /// Due strictly after `now`.
  Upcoming,
  /// Due before `now` and not yet completed.
  Overdue,
}

impl TaskFilter {
  /// Whether a task passes this filter relative to the given instant.
  pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
    match self {
      Self::All => true,
      Self::Completed => task.completed,
      Self::Active => !task.completed,
      Self::Today => task
        .due_date
        .is_some_and(|due| due.date_naive() == now.date_naive()),
      Self::Upcoming => task.due_date.is_some_and(|due| due > now),
      Self::Overdue => !task.completed && task.due_date.is_some_and(|due| due < now),
    }
  }
}

/// A task joined with its project's display name. Recomputed on every read;
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskWithProject {
  pub task: Task,
  pub project_name: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn task(completed: bool, due: Option<DateTime<Utc>>) -> Task {
    Task {
      id: "t1".to_string(),
      title: "A task".to_string(),
      description: None,
      completed,
      priority: Priority::Medium,
      due_date: due,
      project_id: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn patch_applies_only_listed_fields() {
    let mut t = task(false, None);
    let patch = TaskPatch {
      title: Some("Renamed".to_string()),
      description: Some(Some("notes".to_string())),
      ..Default::default()
    };
    patch.apply(&mut t);

    assert_eq!(t.title, "Renamed");
    assert_eq!(t.description.as_deref(), Some("notes"));
    assert!(!t.completed);
    assert_eq!(t.priority, Priority::Medium);
  }

  #[test]
  fn patch_distinguishes_clear_from_unchanged() {
    let mut t = task(false, None);
    t.description = Some("keep me".to_string());

    TaskPatch::default().apply(&mut t);
    assert_eq!(t.description.as_deref(), Some("keep me"));

    let clear = TaskPatch {
      description: Some(None),
      ..Default::default()
    };
    clear.apply(&mut t);
    assert_eq!(t.description, None);
  }

  #[test]
  fn filter_overdue_ignores_completed_tasks() {
    let now = Utc::now();
    let overdue = task(false, Some(now - Duration::days(2)));
    let done = task(true, Some(now - Duration::days(2)));

    assert!(TaskFilter::Overdue.matches(&overdue, now));
    assert!(!TaskFilter::Overdue.matches(&done, now));
  }

  #[test]
  fn filter_today_compares_calendar_dates() {
    use chrono::TimeZone;

    // Fixed midday instant so adding minutes never crosses a date boundary
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    let today = task(false, Some(now + Duration::minutes(5)));
    let tomorrow = task(false, Some(now + Duration::days(1)));

    assert!(TaskFilter::Today.matches(&today, now));
    assert!(!TaskFilter::Today.matches(&tomorrow, now));
    assert!(TaskFilter::Upcoming.matches(&tomorrow, now));
  }

  #[test]
  fn task_serializes_with_camel_case_fields() {
    let t = task(false, None);
    let json = serde_json::to_value(&t).unwrap();

    assert!(json.get("createdAt").is_some());
    assert!(json.get("created_at").is_none());
    assert_eq!(json.get("priority").unwrap(), "medium");
    // Absent optional fields are omitted from the payload
    assert!(json.get("projectId").is_none());
  }
}
