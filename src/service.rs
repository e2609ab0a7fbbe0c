//! Task operations exposed to the command layer.
//!
//! `TaskService` turns caller-supplied data into validated entity changes and
//! hands the results to its [`TaskStore`]. It never touches the file itself.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::fields::{Category, Priority, Status};
use crate::store::TaskStore;
use crate::task::Task;

/// Input for [`TaskService::create_task`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub progress: Option<u8>,
    pub estimated_hours: Option<i32>,
    pub assigned_to: Option<String>,
    pub project_id: Option<String>,
    pub notes: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask { title: title.into(), ..Default::default() }
    }
}

/// Partial update for [`TaskService::update_task`].
///
/// `None` leaves a field unchanged. Optional fields are cleared with their
/// `clear_*` flag; a clear wins over a value given for the same field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub clear_category: bool,
    pub status: Option<Status>,
    pub due_date: Option<NaiveDate>,
    pub clear_due_date: bool,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub progress: Option<u8>,
    pub estimated_hours: Option<i32>,
    pub clear_estimated_hours: bool,
    pub assigned_to: Option<String>,
    pub clear_assigned_to: bool,
    pub project_id: Option<String>,
    pub clear_project_id: bool,
    pub notes: Option<String>,
    pub clear_notes: bool,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        TaskPatch { status: Some(status), ..Default::default() }
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && !self.clear_description
            && self.priority.is_none()
            && self.category.is_none()
            && !self.clear_category
            && self.status.is_none()
            && self.due_date.is_none()
            && !self.clear_due_date
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
            && self.progress.is_none()
            && self.estimated_hours.is_none()
            && !self.clear_estimated_hours
            && self.assigned_to.is_none()
            && !self.clear_assigned_to
            && self.project_id.is_none()
            && !self.clear_project_id
            && self.notes.is_none()
            && !self.clear_notes
    }

    /// Apply every present field. Validating setters run first, so an error
    /// is returned before any non-validating field has been touched. An
    /// explicit status is applied last and overrides one implied by progress.
    fn apply(self, task: &mut Task) -> std::result::Result<(), ValidationError> {
        if let Some(title) = self.title {
            task.set_title(title)?;
        }
        if self.clear_description {
            task.set_description(None)?;
        } else if let Some(description) = self.description {
            task.set_description(Some(description))?;
        }
        if self.clear_estimated_hours {
            task.set_estimated_hours(None)?;
        } else if let Some(hours) = self.estimated_hours {
            task.set_estimated_hours(Some(hours))?;
        }
        if let Some(progress) = self.progress {
            task.set_progress(progress)?;
        }
        if let Some(priority) = self.priority {
            task.set_priority(priority);
        }
        if self.clear_category {
            task.set_category(None);
        } else if let Some(category) = self.category {
            task.set_category(Some(category));
        }
        if self.clear_due_date {
            task.set_due_date(None);
        } else if let Some(due) = self.due_date {
            task.set_due_date(Some(due));
        }
        for tag in &self.remove_tags {
            task.remove_tag(tag);
        }
        for tag in &self.add_tags {
            task.add_tag(tag);
        }
        if self.clear_assigned_to {
            task.set_assigned_to(None);
        } else if let Some(assignee) = self.assigned_to {
            task.set_assigned_to(Some(assignee));
        }
        if self.clear_project_id {
            task.set_project_id(None);
        } else if let Some(project) = self.project_id {
            task.set_project_id(Some(project));
        }
        if self.clear_notes {
            task.set_notes(None);
        } else if let Some(notes) = self.notes {
            task.set_notes(Some(notes));
        }
        if let Some(status) = self.status {
            task.set_status(status);
        }
        Ok(())
    }
}

/// Orchestrates task operations over a [`TaskStore`].
#[derive(Debug)]
pub struct TaskService {
    store: TaskStore,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        TaskService { store }
    }

    /// Build a task from `data` and persist it.
    ///
    /// An over-long title or description fails before anything is stored.
    pub fn create_task(&mut self, data: NewTask) -> Result<Task> {
        let mut task = Task::new(data.title)?;
        if let Some(description) = data.description {
            task.set_description(Some(description))?;
        }
        if let Some(hours) = data.estimated_hours {
            task.set_estimated_hours(Some(hours))?;
        }
        if let Some(priority) = data.priority {
            task.set_priority(priority);
        }
        if let Some(category) = data.category {
            task.set_category(Some(category));
        }
        if let Some(due) = data.due_date {
            task.set_due_date(Some(due));
        }
        for tag in &data.tags {
            task.add_tag(tag);
        }
        if data.assigned_to.is_some() {
            task.set_assigned_to(data.assigned_to);
        }
        if data.project_id.is_some() {
            task.set_project_id(data.project_id);
        }
        if data.notes.is_some() {
            task.set_notes(data.notes);
        }
        if let Some(progress) = data.progress {
            task.set_progress(progress)?;
        }
        self.store.save(task.clone())?;
        debug!(task_id = task.id(), "Created task");
        Ok(task)
    }

    /// Apply `patch` to the task with `id` and persist the result.
    ///
    /// The patch is applied to a copy. The stored task changes only if every
    /// field validates and the save succeeds.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        require_id(id)?;
        let mut task = self.store.find_by_id(id)?.clone();
        patch.apply(&mut task)?;
        self.store.save(task.clone())?;
        debug!(task_id = id, status = %task.status(), "Updated task");
        Ok(task)
    }

    /// Delete the task with `id`, returning it.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        require_id(id)?;
        let removed = self.store.delete_by_id(id)?;
        debug!(task_id = id, "Deleted task");
        Ok(removed)
    }

    pub fn read_available_tasks(&self) -> Vec<Task> {
        self.store.fetch_all()
    }

    pub fn find_task_by_id(&self, id: &str) -> Result<Task> {
        require_id(id)?;
        self.store.find_by_id(id).cloned()
    }
}

fn require_id(id: &str) -> std::result::Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}
