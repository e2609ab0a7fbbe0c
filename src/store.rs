//! File-backed task repository.
//!
//! `TaskStore` owns the authoritative in-memory map of tasks and mirrors it
//! to a JSON array on disk after every mutation. Only one process is expected
//! to write the file; concurrent writers are last-writer-wins.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TaskError, ValidationError};
use crate::task::Task;

/// In-memory task collection keyed by id, persisted to a JSON file.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: HashMap<String, Task>,
}

impl TaskStore {
    /// Load tasks from `path`, starting empty if the file doesn't exist.
    ///
    /// Never fails: unreadable or malformed content is logged and treated as
    /// an empty collection.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tasks = read_tasks(&path)
            .into_iter()
            .filter_map(|task| {
                if task.id().trim().is_empty() {
                    warn!(path = %path.display(), title = task.title(), "Skipping stored task without an id");
                    return None;
                }
                Some((task.id().to_string(), task))
            })
            .collect::<HashMap<_, _>>();
        info!(path = %path.display(), count = tasks.len(), "Loaded tasks");
        TaskStore { path, tasks }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Insert or replace `task`, then rewrite the file.
    ///
    /// If the write fails the previous entry is put back, so the map never
    /// runs ahead of what a caller was told succeeded.
    pub fn save(&mut self, task: Task) -> Result<()> {
        if task.id().trim().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        let id = task.id().to_string();
        let previous = self.tasks.insert(id.clone(), task);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.tasks.insert(id, old),
                None => self.tasks.remove(&id),
            };
            return Err(e);
        }
        debug!(task_id = %id, "Saved task");
        Ok(())
    }

    /// Borrow the live task with the given id.
    pub fn find_by_id(&self, id: &str) -> Result<&Task> {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        self.tasks.get(id).ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    /// Remove the task with the given id and rewrite the file.
    pub fn delete_by_id(&mut self, id: &str) -> Result<Task> {
        let removed = self.tasks.remove(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if let Err(e) = self.persist() {
            self.tasks.insert(removed.id().to_string(), removed);
            return Err(e);
        }
        debug!(task_id = %id, "Deleted task");
        Ok(removed)
    }

    /// Snapshot of every task. Order is unspecified.
    pub fn fetch_all(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Atomic write via temp file + rename.
    fn persist(&self) -> Result<()> {
        self.write_file().map_err(|source| TaskError::Persistence {
            path: self.path.clone(),
            source,
        })
    }

    fn write_file(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut ordered: Vec<&Task> = self.tasks.values().collect();
        ordered.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
        let data = serde_json::to_string_pretty(&ordered)?;

        let tmp = sibling_path(&self.path, ".tmp");
        let result = write_then_rename(&tmp, &self.path, data.as_bytes());
        if result.is_err() {
            // Best effort; the write error is what gets reported.
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut f = File::create(tmp)?;
    f.write_all(data)?;
    f.sync_all()?;
    fs::rename(tmp, path)
}

/// `path` with `suffix` appended to its file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Read every task that parses. Records that fail are skipped, and a copy of
/// the file is kept at `<file>.corrupt` so the next save can't lose them.
fn read_tasks(path: &Path) -> Vec<Task> {
    let buf = match fs::read_to_string(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error reading task file, starting fresh");
            return Vec::new();
        }
    };
    if buf.trim().is_empty() {
        return Vec::new();
    }
    let records: Vec<serde_json::Value> = match serde_json::from_str(&buf) {
        Ok(records) => records,
        Err(e) => {
            let kept = preserve_unreadable(path, true);
            warn!(path = %path.display(), kept = %kept, error = %e, "Error parsing task file, starting fresh");
            return Vec::new();
        }
    };

    let mut tasks = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                skipped += 1;
                warn!(path = %path.display(), index, error = %e, "Skipping unreadable task record");
            }
        }
    }
    if skipped > 0 {
        let kept = preserve_unreadable(path, false);
        warn!(path = %path.display(), kept = %kept, skipped, "Kept a copy of the task file");
    }
    tasks
}

/// Move (or copy, when some records were still usable) the file aside to
/// `<file>.corrupt`. Returns the new path, or a note if that failed.
fn preserve_unreadable(path: &Path, move_aside: bool) -> String {
    let target = sibling_path(path, ".corrupt");
    let result = if move_aside {
        fs::rename(path, &target)
    } else {
        fs::copy(path, &target).map(|_| ())
    };
    match result {
        Ok(()) => target.display().to_string(),
        Err(e) => format!("not kept ({e})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, Status};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TaskStore {
        TaskStore::load(dir.path().join("tasks.json"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_empty_and_malformed_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        fs::write(&path, "  \n").unwrap();
        assert!(TaskStore::load(&path).is_empty());

        fs::write(&path, "{ not json").unwrap();
        assert!(TaskStore::load(&path).is_empty());

        fs::write(&path, r#"{"id": "a"}"#).unwrap();
        assert!(TaskStore::load(&path).is_empty());
    }

    #[test]
    fn test_unparseable_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = TaskStore::load(&path);
        assert!(store.is_empty());
        assert!(!path.exists());
        let corrupt = dir.path().join("tasks.json.corrupt");
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{ not json");

        store.save(Task::new("fresh").unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{ not json");
    }

    #[test]
    fn test_bad_record_keeps_the_rest_and_a_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let raw = r#"[
            {"id": "good", "title": "kept", "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"},
            {"id": "bad", "title": "broken", "priority": "SOMEDAY", "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"}
        ]"#;
        fs::write(&path, raw).unwrap();

        let store = TaskStore::load(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id("good").unwrap().title(), "kept");
        assert!(store.find_by_id("bad").unwrap_err().is_not_found());
        assert_eq!(fs::read_to_string(dir.path().join("tasks.json.corrupt")).unwrap(), raw);
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn test_save_then_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut a = Task::new("First").unwrap();
        a.set_description(Some("details".into())).unwrap();
        a.set_category(Some(Category::Work));
        a.add_tag("home");
        let mut b = Task::new("Second").unwrap();
        b.mark_as_completed();
        store.save(a.clone()).unwrap();
        store.save(b.clone()).unwrap();

        let reloaded = TaskStore::load(store.path());
        assert_eq!(reloaded.len(), 2);
        for original in [&a, &b] {
            let loaded = reloaded.find_by_id(original.id()).unwrap();
            assert_eq!(
                serde_json::to_value(loaded).unwrap(),
                serde_json::to_value(original).unwrap()
            );
        }
    }

    #[test]
    fn test_save_upserts_by_id() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let mut task = Task::new("Draft").unwrap();
        store.save(task.clone()).unwrap();

        task.set_status(Status::InProgress);
        store.save(task.clone()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(task.id()).unwrap().status(), Status::InProgress);
    }

    #[test]
    fn test_find_by_id_errors() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(
            store.find_by_id("  "),
            Err(TaskError::Validation(ValidationError::EmptyId))
        ));
        assert!(matches!(store.find_by_id("nonexistent-id"), Err(TaskError::NotFound(id)) if id == "nonexistent-id"));
    }

    #[test]
    fn test_delete_twice_fails_second_time() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let keep = Task::new("Keep").unwrap();
        let gone = Task::new("Gone").unwrap();
        store.save(keep.clone()).unwrap();
        store.save(gone.clone()).unwrap();

        let removed = store.delete_by_id(gone.id()).unwrap();
        assert_eq!(removed.title(), "Gone");
        assert!(store.delete_by_id(gone.id()).unwrap_err().is_not_found());

        let reloaded = TaskStore::load(store.path());
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find_by_id(keep.id()).is_ok());
    }

    #[test]
    fn test_save_creates_parent_dir_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let mut store = TaskStore::load(&path);
        store.save(Task::new("t").unwrap()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("tasks.json.tmp").exists());
        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("tasks.json");
        fs::create_dir(&path).unwrap();
        let mut store = TaskStore::load(&path);

        let err = store.save(Task::new("t").unwrap()).unwrap_err();
        assert!(matches!(err, TaskError::Persistence { .. }));
        assert!(store.is_empty());
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[
                {"id": "", "title": "ghost", "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"},
                {"id": "real", "title": "kept", "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"}
            ]"#,
        )
        .unwrap();
        let store = TaskStore::load(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id("real").unwrap().title(), "kept");
    }
}
