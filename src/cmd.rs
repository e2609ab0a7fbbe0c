//! Command implementations for the CLI and the interactive shell.
//!
//! Each subcommand maps onto one or two [`TaskService`] calls. Handlers write
//! to the writer they are given and return errors instead of exiting, so the
//! shell can report a failure and keep going.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::dates::{parse_due_input, start_end_of_this_week};
use crate::error::TaskError;
use crate::fields::{Category, DueFilter, Priority, SortKey, Status};
use crate::format::{short_id, TaskFormatter};
use crate::service::{NewTask, TaskPatch, TaskService};
use crate::task::{normalise_tag, Task};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Task title. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "fri", "next fri", "eow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Estimated effort in hours.
        #[arg(long, allow_hyphen_values = true)]
        estimate: Option<i32>,
        /// Person responsible for the task.
        #[arg(long)]
        assignee: Option<String>,
        /// Project the task belongs to.
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Include completed and cancelled tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by category.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Filter by tag. May be repeated. Accepts comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due filter: today | this-week | overdue | none.
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a single task by id, id prefix or title.
    Show {
        id: String,
    },

    /// Change fields on a task.
    Edit {
        /// Task id, id prefix or title
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_desc")]
        desc: Option<String>,
        /// Remove the description.
        #[arg(long)]
        clear_desc: bool,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum, conflicts_with = "clear_category")]
        category: Option<Category>,
        /// Remove the category.
        #[arg(long)]
        clear_category: bool,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
        /// Percent complete, 0-100. 100 completes the task.
        #[arg(long)]
        progress: Option<u8>,
        /// Estimated effort in hours.
        #[arg(long, allow_hyphen_values = true, conflicts_with = "clear_estimate")]
        estimate: Option<i32>,
        #[arg(long)]
        clear_estimate: bool,
        #[arg(long, conflicts_with = "clear_assignee")]
        assignee: Option<String>,
        #[arg(long)]
        clear_assignee: bool,
        #[arg(long, conflicts_with = "clear_project")]
        project: Option<String>,
        #[arg(long)]
        clear_project: bool,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
    },

    /// Mark a task in progress.
    Start {
        id: String,
    },

    /// Mark a task completed.
    Complete {
        id: String,
    },

    /// Cancel a task.
    Cancel {
        id: String,
    },

    /// Set a task back to pending.
    Reopen {
        id: String,
    },

    /// Delete a task.
    Delete {
        id: String,
    },

    /// List distinct tags and counts.
    Tags,

    /// Show counts by status and priority and the completion rate.
    Stats,

    /// Start the interactive shell (the default when no command is given).
    Shell,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run one command against `service`, writing results to `out`.
pub fn execute(
    command: Commands,
    service: &mut TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    match command {
        Commands::Add { title, desc, priority, category, due, tags, estimate, assignee, project, notes } => {
            let due_date = due.as_deref().map(|d| parse_due(d, today)).transpose()?;
            let data = NewTask {
                title: title.join(" ").trim().to_string(),
                description: desc,
                priority,
                category,
                due_date,
                tags: split_tags(&tags),
                estimated_hours: estimate,
                assigned_to: assignee,
                project_id: project,
                notes,
                ..Default::default()
            };
            cmd_add(service, fmt, out, data)
        }
        Commands::List { all, status, priority, category, tags, due, sort, limit } => {
            let filter = ListFilter { all, status, priority, category, tags: split_tags(&tags), due };
            cmd_list(service, fmt, out, &filter, sort, limit, today)
        }
        Commands::Show { id } => cmd_show(service, fmt, out, &id, today),
        Commands::Edit {
            id, title, desc, clear_desc, priority, category, clear_category, status, due, clear_due,
            add_tags, rm_tags, progress, estimate, clear_estimate, assignee, clear_assignee, project,
            clear_project, notes, clear_notes,
        } => {
            let patch = TaskPatch {
                title,
                description: desc,
                clear_description: clear_desc,
                priority,
                category,
                clear_category,
                status,
                due_date: due.as_deref().map(|d| parse_due(d, today)).transpose()?,
                clear_due_date: clear_due,
                add_tags: split_tags(&add_tags),
                remove_tags: split_tags(&rm_tags),
                progress,
                estimated_hours: estimate,
                clear_estimated_hours: clear_estimate,
                assigned_to: assignee,
                clear_assigned_to: clear_assignee,
                project_id: project,
                clear_project_id: clear_project,
                notes,
                clear_notes,
            };
            cmd_edit(service, fmt, out, &id, patch)
        }
        Commands::Start { id } => cmd_set_status(service, fmt, out, &id, Status::InProgress),
        Commands::Complete { id } => cmd_set_status(service, fmt, out, &id, Status::Completed),
        Commands::Cancel { id } => cmd_set_status(service, fmt, out, &id, Status::Cancelled),
        Commands::Reopen { id } => cmd_set_status(service, fmt, out, &id, Status::Pending),
        Commands::Delete { id } => cmd_delete(service, fmt, out, &id),
        Commands::Tags => cmd_tags(service, fmt, out),
        Commands::Stats => cmd_stats(service, fmt, out),
        Commands::Completions { shell } => cmd_completions(shell, out),
        Commands::Shell => bail!("the interactive shell is already running"),
    }
}

/// Add a new task.
pub fn cmd_add(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    data: NewTask,
) -> anyhow::Result<()> {
    if data.title.is_empty() {
        bail!("Please provide a task title");
    }
    let task = service.create_task(data)?;
    writeln!(out, "{}", fmt.success(&format!("Added task {} \"{}\"", short_id(task.id()), task.title())))?;
    Ok(())
}

/// Criteria for `list`.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub all: bool,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub due: Option<DueFilter>,
}

impl ListFilter {
    pub fn matches(&self, t: &Task, today: NaiveDate) -> bool {
        // An explicit status filter overrides hiding closed tasks.
        if !self.all && self.status.is_none() && t.status().is_closed() {
            return false;
        }
        if self.status.is_some_and(|s| t.status() != s) {
            return false;
        }
        if self.priority.is_some_and(|p| t.priority() != p) {
            return false;
        }
        if self.category.is_some() && t.category() != self.category {
            return false;
        }
        if !self.tags.iter().all(|tag| t.tags().contains(tag)) {
            return false;
        }
        match self.due {
            None => true,
            Some(DueFilter::Today) => t.due_date() == Some(today),
            Some(DueFilter::ThisWeek) => {
                let (start, end) = start_end_of_this_week(today);
                t.due_date().is_some_and(|d| d >= start && d <= end)
            }
            Some(DueFilter::Overdue) => t.is_overdue_on(today),
            Some(DueFilter::None) => t.due_date().is_none(),
        }
    }
}

/// Filter, sort and limit a task snapshot.
pub fn select_tasks(
    tasks: Vec<Task>,
    filter: &ListFilter,
    sort: SortKey,
    limit: Option<usize>,
    today: NaiveDate,
) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks.into_iter().filter(|t| filter.matches(t, today)).collect();
    // Creation order breaks every tie so output is stable across runs.
    selected.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
    match sort {
        SortKey::Due => selected.sort_by_key(|t| t.due_date().unwrap_or(NaiveDate::MAX)),
        SortKey::Priority => {
            selected.sort_by_key(|t| (Reverse(t.priority()), t.due_date().unwrap_or(NaiveDate::MAX)))
        }
        SortKey::Created => {}
        SortKey::Title => selected.sort_by_key(|t| t.title().to_lowercase()),
    }
    if let Some(n) = limit {
        selected.truncate(n);
    }
    selected
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(
    service: &TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    filter: &ListFilter,
    sort: SortKey,
    limit: Option<usize>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let tasks = select_tasks(service.read_available_tasks(), filter, sort, limit, today);
    if tasks.is_empty() {
        writeln!(out, "{}", fmt.info("No tasks found."))?;
    } else {
        writeln!(out, "{}", fmt.task_table(&tasks, today))?;
    }
    Ok(())
}

/// Show detailed information about a specific task.
pub fn cmd_show(
    service: &TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    identifier: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let id = resolve_task_id(service, identifier)?;
    let task = service.find_task_by_id(&id)?;
    writeln!(out, "{}", fmt.task_detail(&task, today))?;
    Ok(())
}

/// Update an existing task's fields.
pub fn cmd_edit(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    identifier: &str,
    patch: TaskPatch,
) -> anyhow::Result<()> {
    let id = resolve_task_id(service, identifier)?;
    if patch.is_empty() {
        writeln!(out, "{}", fmt.warning("Nothing to change. Pass at least one option, see `edit --help`."))?;
        return Ok(());
    }
    let task = service.update_task(&id, patch)?;
    writeln!(out, "{}", fmt.success(&format!("Updated task {} \"{}\"", short_id(task.id()), task.title())))?;
    Ok(())
}

/// Move a task to `status`; backs `start`, `complete`, `cancel` and `reopen`.
pub fn cmd_set_status(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    identifier: &str,
    status: Status,
) -> anyhow::Result<()> {
    let id = resolve_task_id(service, identifier)?;
    let task = service.update_task(&id, TaskPatch::status(status))?;
    writeln!(
        out,
        "{}",
        fmt.success(&format!("Task {} \"{}\" is now {}", short_id(task.id()), task.title(), task.status()))
    )?;
    Ok(())
}

/// Delete a task.
pub fn cmd_delete(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    out: &mut impl Write,
    identifier: &str,
) -> anyhow::Result<()> {
    let id = resolve_task_id(service, identifier)?;
    let task = service.delete_task(&id)?;
    writeln!(out, "{}", fmt.warning(&format!("Deleted task {} \"{}\"", short_id(task.id()), task.title())))?;
    Ok(())
}

/// List all distinct tags with their usage counts.
pub fn cmd_tags(service: &TaskService, fmt: &TaskFormatter, out: &mut impl Write) -> anyhow::Result<()> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for t in service.read_available_tasks() {
        for tag in t.tags() {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        writeln!(out, "{}", fmt.info("No tags in use."))?;
    } else {
        writeln!(out, "{}", fmt.tag_counts(&counts))?;
    }
    Ok(())
}

/// Print task statistics.
pub fn cmd_stats(service: &TaskService, fmt: &TaskFormatter, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", fmt.stats(&service.read_available_tasks()))?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell, out: &mut impl Write) -> anyhow::Result<()> {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, out);
    Ok(())
}

/// Resolve a task identifier to a full id.
///
/// Tries, in order: exact id, unique id prefix, unique case-insensitive
/// title. A blank identifier is passed through so the service rejects it.
pub fn resolve_task_id(service: &TaskService, identifier: &str) -> anyhow::Result<String> {
    match service.find_task_by_id(identifier) {
        Ok(task) => return Ok(task.id().to_string()),
        Err(TaskError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let needle = identifier.trim();
    let tasks = service.read_available_tasks();
    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id().starts_with(needle)).collect();
    if let Some(id) = unique_match(&by_prefix, identifier)? {
        return Ok(id);
    }

    let lowered = needle.to_lowercase();
    let by_title: Vec<&Task> = tasks.iter().filter(|t| t.title().to_lowercase() == lowered).collect();
    if let Some(id) = unique_match(&by_title, identifier)? {
        return Ok(id);
    }

    Err(TaskError::NotFound(identifier.to_string()).into())
}

fn unique_match(matches: &[&Task], identifier: &str) -> anyhow::Result<Option<String>> {
    match matches {
        [] => Ok(None),
        [only] => Ok(Some(only.id().to_string())),
        many => {
            let mut msg = format!("Multiple tasks match '{identifier}':\n");
            for t in many {
                msg.push_str(&format!("  {}  {}\n", short_id(t.id()), t.title()));
            }
            msg.push_str("Please use a longer id instead.");
            Err(anyhow!(msg))
        }
    }
}

fn parse_due(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    parse_due_input(input, today)
        .with_context(|| format!("Unrecognised due date '{input}'. Try YYYY-MM-DD, today, tomorrow, fri or 'in 3d'"))
}

/// Split comma-separated tag arguments and normalise each tag.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in inputs.iter().flat_map(|raw| raw.split(',')).map(normalise_tag) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}
