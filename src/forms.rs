//! Form field state and validation for the task and project dialogs.
//!
//! Forms hold fields the way a dialog would: as strings. `validate`
//! performs required-field checks only (no cross-field or business rules)
//! and returns either a draft ready for the repository or a map of field
//! name to message for inline display. Validation failures block
//! submission; they are returned, never logged and swallowed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::model::{Priority, Project, ProjectDraft, Task, TaskDraft};

/// Field-keyed validation messages, ordered for stable display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
  errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
  pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
    self.errors.insert(field, message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  /// Message for a single field, if it failed.
  pub fn field(&self, field: &str) -> Option<&str> {
    self.errors.get(field).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
    self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in self.errors.iter() {
      if !first {
        write!(f, "; ")?;
      }
      write!(f, "{field}: {message}")?;
      first = false;
    }
    Ok(())
  }
}

/// Field state for the task dialog.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
  pub title: String,
  pub description: String,
  pub priority: String,
  /// RFC 3339 timestamp, or empty for no due date.
  pub due_date: String,
  pub project_id: Option<String>,
  pub completed: bool,
}

impl TaskForm {
  /// Prefill the form from an existing task (edit flow).
  pub fn from_task(task: &Task) -> Self {
    Self {
      title: task.title.clone(),
      description: task.description.clone().unwrap_or_default(),
      priority: task.priority.as_str().to_string(),
      due_date: task
        .due_date
        .map(|d| d.to_rfc3339())
        .unwrap_or_default(),
      project_id: task.project_id.clone(),
      completed: task.completed,
    }
  }

  /// Validate the fields and build a draft. Errors are keyed by field.
  pub fn validate(&self) -> Result<TaskDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = self.title.trim();
    if title.is_empty() {
      errors.push("title", "Title is required");
    }

    let priority = if self.priority.trim().is_empty() {
      Priority::default()
    } else {
      match Priority::parse(self.priority.trim()) {
        Some(p) => p,
        None => {
          errors.push("priority", format!("Unknown priority: {}", self.priority));
          Priority::default()
        }
      }
    };

    let due_date = parse_optional_date(&self.due_date, "due_date", &mut errors);

    if !errors.is_empty() {
      return Err(errors);
    }

    let description = self.description.trim();
    Ok(TaskDraft {
      title: title.to_string(),
      description: (!description.is_empty()).then(|| description.to_string()),
      completed: self.completed,
      priority,
      due_date,
      project_id: self.project_id.clone(),
    })
  }
}

/// Field state for the project dialog.
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
  pub name: String,
  pub color: String,
}

impl ProjectForm {
  /// Prefill the form from an existing project (edit flow).
  pub fn from_project(project: &Project) -> Self {
    Self {
      name: project.name.clone(),
      color: project.color.clone().unwrap_or_default(),
    }
  }

  pub fn validate(&self) -> Result<ProjectDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = self.name.trim();
    if name.is_empty() {
      errors.push("name", "Name is required");
    }

    if !errors.is_empty() {
      return Err(errors);
    }

    let color = self.color.trim();
    Ok(ProjectDraft {
      name: name.to_string(),
      color: (!color.is_empty()).then(|| color.to_string()),
    })
  }
}

fn parse_optional_date(
  value: &str,
  field: &'static str,
  errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }

  match DateTime::parse_from_rfc3339(value) {
    Ok(parsed) => Some(parsed.with_timezone(&Utc)),
    Err(_) => {
      errors.push(field, "Expected an RFC 3339 timestamp");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_title_blocks_submission() {
    let form = TaskForm {
      title: "   ".to_string(),
      ..Default::default()
    };

    let errors = form.validate().unwrap_err();
    assert_eq!(errors.field("title"), Some("Title is required"));
  }

  #[test]
  fn valid_form_builds_a_draft() {
    let form = TaskForm {
      title: "  Ship it  ".to_string(),
      description: "with tests".to_string(),
      priority: "high".to_string(),
      due_date: "2026-09-04T12:00:00Z".to_string(),
      project_id: Some("p1".to_string()),
      completed: false,
    };

    let draft = form.validate().unwrap();
    assert_eq!(draft.title, "Ship it");
    assert_eq!(draft.description.as_deref(), Some("with tests"));
    assert_eq!(draft.priority, Priority::High);
    assert!(draft.due_date.is_some());
    assert_eq!(draft.project_id.as_deref(), Some("p1"));
  }

  #[test]
  fn blank_priority_falls_back_to_default() {
    let form = TaskForm {
      title: "Task".to_string(),
      ..Default::default()
    };

    let draft = form.validate().unwrap();
    assert_eq!(draft.priority, Priority::Medium);
    assert_eq!(draft.due_date, None);
    assert_eq!(draft.description, None);
  }

  #[test]
  fn bad_date_and_priority_are_reported_together() {
    let form = TaskForm {
      title: "Task".to_string(),
      priority: "urgent".to_string(),
      due_date: "next tuesday".to_string(),
      ..Default::default()
    };

    let errors = form.validate().unwrap_err();
    assert!(errors.field("priority").is_some());
    assert!(errors.field("due_date").is_some());
    assert_eq!(errors.iter().count(), 2);
  }

  #[test]
  fn project_form_requires_a_name() {
    let form = ProjectForm::default();
    let errors = form.validate().unwrap_err();
    assert_eq!(errors.field("name"), Some("Name is required"));

    let form = ProjectForm {
      name: "Work".to_string(),
      color: "#FF5733".to_string(),
    };
    let draft = form.validate().unwrap();
    assert_eq!(draft.name, "Work");
    assert_eq!(draft.color.as_deref(), Some("#FF5733"));
  }

  #[test]
  fn edit_prefill_round_trips_through_validate() {
    let task = Task {
      id: "t1".to_string(),
      title: "Edit me".to_string(),
      description: Some("body".to_string()),
      completed: true,
      priority: Priority::Low,
      due_date: Some(Utc::now()),
      project_id: Some("p1".to_string()),
      created_at: Utc::now(),
    };

    let draft = TaskForm::from_task(&task).validate().unwrap();
    assert_eq!(draft.title, task.title);
    assert_eq!(draft.description, task.description);
    assert_eq!(draft.completed, task.completed);
    assert_eq!(draft.priority, task.priority);
    assert_eq!(draft.project_id, task.project_id);
  }
}
