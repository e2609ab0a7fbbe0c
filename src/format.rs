//! Terminal output: coloured messages, task tables and detail views.
//!
//! Every function returns a `String` so callers choose the stream. With
//! colour disabled the output is plain text with identical layout.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use crossterm::style::{style, Color, Stylize};

use crate::dates::format_due_relative;
use crate::fields::{Priority, Status};
use crate::task::Task;

/// Number of id characters shown in tables.
pub const SHORT_ID_LEN: usize = 8;

/// Tasks due within this many days are highlighted.
const DUE_SOON_DAYS: i64 = 2;

const SEPARATOR_WIDTH: usize = 60;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct TaskFormatter {
    color: bool,
}

impl TaskFormatter {
    pub fn new(color: bool) -> Self {
        TaskFormatter { color }
    }

    pub fn header(&self) -> String {
        let rule = "═".repeat(SEPARATOR_WIDTH);
        let title = format!("{:^width$}", "TASK MANAGER", width = SEPARATOR_WIDTH);
        format!(
            "{}\n{}\n{}",
            self.paint(&rule, Color::Cyan, true),
            self.paint(&title, Color::Cyan, false),
            self.paint(&rule, Color::Cyan, true)
        )
    }

    pub fn success(&self, message: &str) -> String {
        self.paint(message, Color::Green, true)
    }

    pub fn error(&self, message: &str) -> String {
        self.paint(&format!("Error: {message}"), Color::Red, true)
    }

    pub fn info(&self, message: &str) -> String {
        self.paint(message, Color::Blue, false)
    }

    pub fn warning(&self, message: &str) -> String {
        self.paint(message, Color::Yellow, false)
    }

    pub fn prompt(&self, message: &str) -> String {
        format!("{} ", self.paint(&format!("{message} >"), Color::Magenta, true))
    }

    /// Command reference for the interactive shell.
    pub fn help_menu(&self) -> String {
        const COMMANDS: [(&str, &str); 14] = [
            ("add <title> [--priority P] [--due D] ...", "Create a task"),
            ("list [--all] [--status S] [--sort K]", "List tasks"),
            ("show <id>", "Show task details"),
            ("edit <id> [--title T] [--desc D] ...", "Change task fields"),
            ("start <id>", "Mark a task in progress"),
            ("complete <id>", "Mark a task completed"),
            ("cancel <id>", "Cancel a task"),
            ("reopen <id>", "Set a task back to pending"),
            ("delete <id>", "Delete a task"),
            ("tags", "List tags with counts"),
            ("stats", "Show task statistics"),
            ("<command> --help", "Options for a command"),
            ("help", "Show this menu"),
            ("exit", "Leave the task manager"),
        ];
        let mut out = self.paint("Available commands:", Color::Cyan, true);
        for (usage, about) in COMMANDS {
            out.push('\n');
            out.push_str(&format!("  {}  {}", self.paint(&format!("{usage:<44}"), Color::Yellow, false), about));
        }
        out.push('\n');
        out.push_str(&self.paint(&"─".repeat(SEPARATOR_WIDTH), Color::DarkGrey, false));
        out
    }

    /// Table of tasks, one row each, in the order given.
    pub fn task_table(&self, tasks: &[Task], today: NaiveDate) -> String {
        let mut out = self.paint(
            &format!("{:<8} {:<11} {:<8} {:<9} {:<10} {}", "ID", "Status", "Priority", "Category", "Due", "Title [tags]"),
            Color::White,
            true,
        );
        for t in tasks {
            let tags = if t.tags().is_empty() {
                String::new()
            } else {
                format!(" [{}]", t.tags().join(","))
            };
            let category = t.category().map_or("-", |c| c.display_name());
            out.push('\n');
            out.push_str(&format!(
                "{:<8} {} {} {:<9} {} {}{}",
                short_id(t.id()),
                self.status(t.status(), 11),
                self.priority(t.priority(), 8),
                truncate(category, 9),
                self.due(t, today, 10),
                t.title(),
                tags
            ));
        }
        out
    }

    /// Full view of a single task.
    pub fn task_detail(&self, task: &Task, today: NaiveDate) -> String {
        let due = match task.due_date() {
            Some(d) => format!("{d} ({})", self.due(task, today, 0)),
            None => "-".into(),
        };
        let lines = [
            ("ID", task.id().to_string()),
            ("Title", task.title().to_string()),
            ("Status", self.status(task.status(), 0)),
            ("Priority", self.priority(task.priority(), 0)),
            ("Category", task.category().map_or_else(|| "-".into(), |c| c.to_string())),
            ("Due", due),
            ("Tags", if task.tags().is_empty() { "-".into() } else { task.tags().join(",") }),
            ("Progress", self.progress_bar(u32::from(task.progress()), 100, PROGRESS_BAR_WIDTH)),
            ("Estimate", task.estimated_hours().map_or_else(|| "-".into(), |h| format!("{h}h"))),
            ("Assignee", task.assigned_to().unwrap_or("-").to_string()),
            ("Project", task.project_id().unwrap_or("-").to_string()),
            ("Created", local_time(task.created_at())),
            ("Updated", local_time(task.updated_at())),
            ("Completed", task.completed_at().map_or_else(|| "-".into(), local_time)),
        ];
        let mut out = String::new();
        for (label, value) in lines {
            out.push_str(&format!("{:<13}{value}\n", format!("{label}:")));
        }
        out.push_str(&format!("Description:\n{}", task.description().unwrap_or("-")));
        if let Some(notes) = task.notes() {
            out.push_str(&format!("\nNotes:\n{notes}"));
        }
        out
    }

    /// Totals by status and priority plus the completion rate.
    pub fn stats(&self, tasks: &[Task]) -> String {
        let total = tasks.len();
        let by_status = |s: Status| tasks.iter().filter(|t| t.status() == s).count();
        let by_priority = |p: Priority| tasks.iter().filter(|t| t.priority() == p).count();
        let completed = by_status(Status::Completed);

        let mut out = self.paint("Task Statistics", Color::Cyan, true);
        out.push('\n');
        out.push_str(&self.paint(&"─".repeat(SEPARATOR_WIDTH), Color::DarkGrey, false));
        out.push_str(&format!("\n{:<17}{total}", "Total Tasks:"));
        let statuses = [Status::Completed, Status::InProgress, Status::Pending, Status::Cancelled];
        for (i, status) in statuses.into_iter().enumerate() {
            let branch = if i + 1 == statuses.len() { "└─" } else { "├─" };
            let label = format!("{branch} {}:", status.display_name());
            out.push_str(&format!("\n{label:<17}{}", self.status_count(status, by_status(status))));
        }

        out.push_str(&format!("\n\n{}", self.paint("Priority Breakdown:", Color::White, true)));
        let priorities = [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];
        for (i, priority) in priorities.into_iter().enumerate() {
            let branch = if i + 1 == priorities.len() { "└─" } else { "├─" };
            let label = format!("{branch} {}:", priority.display_name());
            out.push_str(&format!("\n{label:<17}{}", by_priority(priority)));
        }

        if total > 0 {
            let rate = completed as f64 / total as f64 * 100.0;
            out.push_str(&format!("\n\n{:<17}{rate:.1}%", "Completion Rate:"));
            out.push_str(&format!("\n{}", self.progress_bar(completed as u32, total as u32, PROGRESS_BAR_WIDTH)));
        }
        out
    }

    /// `[████░░░░] 50.0% (1/2)`. Empty when `total` is zero.
    pub fn progress_bar(&self, current: u32, total: u32, width: usize) -> String {
        if total == 0 {
            return String::new();
        }
        let current = current.min(total);
        let filled = (current as usize * width) / total as usize;
        let percentage = f64::from(current) / f64::from(total) * 100.0;
        format!(
            "[{}{}] {percentage:.1}% ({current}/{total})",
            self.paint(&"█".repeat(filled), Color::Green, false),
            "░".repeat(width - filled)
        )
    }

    fn status_count(&self, status: Status, count: usize) -> String {
        let color = match status {
            Status::Completed => Color::Green,
            Status::InProgress => Color::Yellow,
            Status::Pending => Color::Red,
            Status::Cancelled => Color::DarkGrey,
        };
        self.paint(&count.to_string(), color, false)
    }

    /// Tag usage table for the `tags` command.
    pub fn tag_counts(&self, counts: &BTreeMap<String, usize>) -> String {
        let mut out = self.paint(&format!("{:<16} {}", "Tag", "Count"), Color::White, true);
        for (tag, count) in counts {
            out.push_str(&format!("\n{:<16} {count}", truncate(tag, 16)));
        }
        out
    }

    fn status(&self, status: Status, width: usize) -> String {
        let color = match status {
            Status::Pending => Color::Yellow,
            Status::InProgress => Color::Cyan,
            Status::Completed => Color::Green,
            Status::Cancelled => Color::DarkGrey,
        };
        self.paint(&format!("{:<width$}", status.display_name()), color, false)
    }

    fn priority(&self, priority: Priority, width: usize) -> String {
        let text = format!("{:<width$}", priority.display_name());
        match priority {
            Priority::Low => self.paint(&text, Color::DarkGrey, false),
            Priority::Medium => self.paint(&text, Color::White, false),
            Priority::High => self.paint(&text, Color::Yellow, false),
            Priority::Urgent => self.paint(&text, Color::Red, true),
        }
    }

    fn due(&self, task: &Task, today: NaiveDate, width: usize) -> String {
        let text = format!("{:<width$}", format_due_relative(task.due_date(), today));
        if task.is_overdue_on(today) && !task.status().is_closed() {
            self.paint(&text, Color::Red, true)
        } else if task.is_due_soon_on(today, DUE_SOON_DAYS) && !task.status().is_closed() {
            self.paint(&text, Color::Yellow, false)
        } else {
            text
        }
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.color {
            return text.to_string();
        }
        let styled = style(text).with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }
}

/// First [`SHORT_ID_LEN`] characters of an id.
pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
