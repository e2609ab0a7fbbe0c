//! Task data structure and its state rules.
//!
//! This module defines the `Task` entity: an identified record whose setters
//! validate before assigning, whose status and progress move together, and
//! whose identity is its id alone.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, MAX_DESCRIPTION_LEN, MAX_PROGRESS, MAX_TITLE_LEN};
use crate::fields::{Category, Priority, Status};

/// A single unit of work.
///
/// Fields are private so every write goes through a setter that validates
/// and refreshes `updated_at`. Equality and hashing only look at the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_hours: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default)]
    progress_percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Task {
    /// Create a pending, medium-priority task with a fresh id.
    pub fn new(title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        validate_title(&title)?;
        let now = Utc::now();
        Ok(Task {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            priority: Priority::default(),
            status: Status::default(),
            category: None,
            created_at: now,
            updated_at: now,
            due_date: None,
            completed_at: None,
            estimated_hours: None,
            tags: Vec::new(),
            assigned_to: None,
            project_id: None,
            progress_percentage: 0,
            notes: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn estimated_hours(&self) -> Option<i32> {
        self.estimated_hours
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Completion percentage, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress_percentage
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        self.touch();
        Ok(())
    }

    /// Set or clear (`None`) the description.
    pub fn set_description(&mut self, description: Option<String>) -> Result<(), ValidationError> {
        if let Some(d) = &description {
            validate_description(d)?;
        }
        self.description = description;
        self.touch();
        Ok(())
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.touch();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
        self.touch();
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
        self.touch();
    }

    /// Assign a status. Completing stamps `completed_at` and sets progress
    /// to 100, cancelling clears `completed_at`, any other status leaves both
    /// alone.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.touch();
        match status {
            Status::Completed => {
                self.completed_at = Some(self.updated_at);
                self.progress_percentage = MAX_PROGRESS;
            }
            Status::Cancelled => self.completed_at = None,
            Status::Pending | Status::InProgress => {}
        }
    }

    /// Set progress. Reaching 100 completes the task; any progress moves a
    /// pending task to in progress.
    pub fn set_progress(&mut self, progress: u8) -> Result<(), ValidationError> {
        if progress > MAX_PROGRESS {
            return Err(ValidationError::ProgressOutOfRange { value: progress, max: MAX_PROGRESS });
        }
        self.progress_percentage = progress;
        self.touch();
        if progress == MAX_PROGRESS && self.status != Status::Completed {
            self.set_status(Status::Completed);
        } else if progress > 0 && self.status == Status::Pending {
            self.set_status(Status::InProgress);
        }
        Ok(())
    }

    /// Set or clear the time estimate in hours.
    pub fn set_estimated_hours(&mut self, hours: Option<i32>) -> Result<(), ValidationError> {
        if let Some(value) = hours.filter(|h| *h < 0) {
            return Err(ValidationError::NegativeEstimate { value });
        }
        self.estimated_hours = hours;
        self.touch();
        Ok(())
    }

    pub fn set_assigned_to(&mut self, assignee: Option<String>) {
        self.assigned_to = assignee;
        self.touch();
    }

    pub fn set_project_id(&mut self, project: Option<String>) {
        self.project_id = project;
        self.touch();
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
        self.touch();
    }

    pub fn mark_as_completed(&mut self) {
        self.set_status(Status::Completed);
    }

    /// Start the task, bumping untouched progress to 1%.
    pub fn mark_as_in_progress(&mut self) {
        self.set_status(Status::InProgress);
        if self.progress_percentage == 0 {
            self.progress_percentage = 1;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Past its due date (by local calendar) and not completed.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        matches!(self.due_date, Some(due) if today > due) && !self.is_completed()
    }

    /// Due within `days` days from today and not completed.
    pub fn is_due_soon(&self, days: i64) -> bool {
        self.is_due_soon_on(Local::now().date_naive(), days)
    }

    pub fn is_due_soon_on(&self, today: NaiveDate, days: i64) -> bool {
        match self.due_date {
            Some(due) => due <= today + Duration::days(days) && !self.is_completed(),
            None => false,
        }
    }

    /// Add a normalised tag. Returns `false` if the tag was blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = normalise_tag(tag);
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.touch();
        true
    }

    /// Remove a tag (normalised before matching). Returns `false` if absent.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = normalise_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        if self.tags.len() == before {
            return false;
        }
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let length = title.chars().count();
    if length > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong { length, max: MAX_TITLE_LEN });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong { length, max: MAX_DESCRIPTION_LEN });
    }
    Ok(())
}
