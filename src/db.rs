//! Task storage and utility functions.
//!
//! `Database` is the persisted shape (task list plus `UserStats`). `TaskStore`
//! owns one `Database` together with the `Slot` it is saved to and applies every
//! mutation the board and CLI perform, writing the full state back after each
//! one.

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::fields::*;
use crate::task::{Task, TaskDraft, UserStats};

/// Fixed identifier of the persisted state slot.
pub const STORAGE_KEY: &str = "focus-flow-storage";

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub stats: UserStats,
}

impl Database {
    /// Empty task list with the given starting stats.
    pub fn with_stats(stats: UserStats) -> Self {
        Database { tasks: Vec::new(), stats }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// A named, durable place the serialized state is kept in.
pub trait Slot {
    /// Current contents, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<String>>;
    /// Replace the contents.
    fn write(&mut self, contents: &str) -> Result<()>;
}

/// `<dir>/focus-flow-storage.json` on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn in_dir(dir: &Path) -> Self {
        FileSlot {
            path: dir.join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Slot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    /// Atomic-ish write via temp + rename.
    fn write(&mut self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(contents.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same contents, so a test can keep one
/// handle and reopen a store from it.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemorySlot {
    pub fn with_contents(contents: &str) -> Self {
        let slot = MemorySlot::default();
        *slot.contents.borrow_mut() = Some(contents.to_string());
        slot
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Make subsequent writes fail, as a full disk would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Io(std::io::Error::other("write refused")));
        }
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

/// What `complete_task` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Task moved into `done`; stats were credited.
    Completed,
    /// Task was already `done`; nothing changed.
    AlreadyDone,
    NotFound,
}

/// The task list and stats, bound to the slot they persist to.
pub struct TaskStore<S: Slot = FileSlot> {
    db: Database,
    slot: S,
    persist_error: Option<StoreError>,
}

impl<S: Slot> TaskStore<S> {
    /// Load state from `slot`. Missing, unreadable or corrupt data starts a fresh
    /// state with `fresh_stats`; the slot is overwritten on the next mutation.
    pub fn open(slot: S, fresh_stats: UserStats) -> Self {
        let db = match slot.read() {
            Ok(Some(text)) => match Database::from_json(&text) {
                Ok(db) => db,
                Err(e) => {
                    tracing::warn!(error = %e, "stored state is corrupt, starting fresh");
                    Database::with_stats(fresh_stats)
                }
            },
            Ok(None) => Database::with_stats(fresh_stats),
            Err(e) => {
                tracing::warn!(error = %e, "stored state is unreadable, starting fresh");
                Database::with_stats(fresh_stats)
            }
        };
        tracing::debug!(tasks = db.tasks.len(), "store opened");
        TaskStore {
            db,
            slot,
            persist_error: None,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn tasks(&self) -> &[Task] {
        &self.db.tasks
    }

    pub fn stats(&self) -> &UserStats {
        &self.db.stats
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.db.get(id)
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Store a draft as a new `todo` task created now.
    pub fn add_task(&mut self, draft: TaskDraft) -> &Task {
        self.add_task_at(draft, Utc::now())
    }

    /// Store a draft with a caller-chosen creation time (the day it is planned for).
    pub fn add_task_at(&mut self, draft: TaskDraft, created_at: DateTime<Utc>) -> &Task {
        let task = Task::from_draft(draft, created_at);
        tracing::debug!(id = %task.id, title = %task.title, "task added");
        self.db.tasks.push(task);
        self.db.stats.tasks_created += 1;
        self.persist();
        let last = self.db.tasks.len() - 1;
        &self.db.tasks[last]
    }

    /// Set the status of a task. Any status may follow any other.
    /// Returns whether the task existed.
    pub fn update_status(&mut self, id: &str, status: Status) -> bool {
        let Some(task) = self.db.get_mut(id) else {
            return false;
        };
        task.status = status;
        tracing::debug!(id, ?status, "status updated");
        self.persist();
        true
    }

    /// Remove a task. Stats are left as they are.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.db.tasks.len();
        self.db.tasks.retain(|t| t.id != id);
        if self.db.tasks.len() == before {
            return false;
        }
        tracing::debug!(id, "task deleted");
        self.persist();
        true
    }

    /// Mark a task done and credit its estimate to the focus total. Stats only
    /// move on a transition into `done`, so repeated calls count once.
    pub fn complete_task(&mut self, id: &str) -> Completion {
        let Some(task) = self.db.get_mut(id) else {
            return Completion::NotFound;
        };
        if task.status == Status::Done {
            return Completion::AlreadyDone;
        }
        task.status = Status::Done;
        let minutes = u64::from(task.estimated_time);
        self.db.stats.tasks_completed += 1;
        self.db.stats.total_focus_time += minutes;
        tracing::debug!(id, minutes, "task completed");
        self.persist();
        Completion::Completed
    }

    /// Swap in a whole task list (import / restore). Stats are untouched.
    /// Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut kept: Vec<Task> = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            if kept.iter().any(|t| t.id == task.id) {
                tracing::warn!(id = %task.id, "dropping duplicate task id");
                continue;
            }
            task.estimated_time = task.estimated_time.max(1);
            kept.push(task);
        }
        tracing::debug!(tasks = kept.len(), "task list replaced");
        self.db.tasks = kept;
        self.persist();
    }

    pub fn set_streak_days(&mut self, days: u32) {
        self.db.stats.streak_days = days;
        self.persist();
    }

    pub fn set_daily_goal(&mut self, minutes: u32) {
        self.db.stats.daily_goal_minutes = minutes;
        self.persist();
    }

    /// The last failed write, if any. In-memory state is still current.
    pub fn take_persist_error(&mut self) -> Option<StoreError> {
        self.persist_error.take()
    }

    fn persist(&mut self) {
        let result = self.db.to_json().and_then(|json| self.slot.write(&json));
        match result {
            Ok(()) => self.persist_error = None,
            Err(e) => {
                tracing::error!(error = %e, "failed to persist state");
                self.persist_error = Some(e);
            }
        }
    }
}

/// Copy the state file into `<dir>/backup/<timestamp>_<file>`.
pub fn create_backup(state_path: &Path) -> Result<PathBuf> {
    if !state_path.exists() {
        return Err(StoreError::NothingToBackUp(state_path.to_path_buf()));
    }

    let parent_dir = state_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let file_name = state_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("focus-flow-storage.json");

    let backup_path = backup_dir.join(format!("{timestamp}_{file_name}"));
    fs::copy(state_path, &backup_path)?;
    Ok(backup_path)
}

/// Resolve a task reference: full id, unique id prefix, or exact title (any case).
pub fn resolve_task_identifier(identifier: &str, tasks: &[Task]) -> std::result::Result<String, String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err("Empty task reference".to_string());
    }
    if let Some(task) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(task.id.clone());
    }

    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
    let matches = if by_prefix.is_empty() {
        let wanted = identifier.to_lowercase();
        tasks
            .iter()
            .filter(|t| t.title.to_lowercase() == wanted)
            .collect()
    } else {
        by_prefix
    };

    match matches.len() {
        0 => Err(format!("No task found matching '{identifier}'")),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks match '{identifier}':\n");
            for task in matches {
                error_msg.push_str(&format!(
                    "  {}  {} ({})\n",
                    short_id(&task.id),
                    task.title,
                    format_status(task.status)
                ));
            }
            error_msg.push_str("Please use a longer id instead.");
            Err(error_msg)
        }
    }
}

/// Leading characters of an id, enough to tell tasks apart in listings.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Parse a human day reference relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekday names ("friday", "fri") and "next monday", "this friday"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_day_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|w| today.checked_add_signed(w));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return today.checked_add_signed(Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return today.checked_add_signed(Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<9} {:<8} {:<7} {:<7} {:<9} {:<10} {}",
        "ID", "Status", "Pri", "Est", "Category", "Day", "Title"
    );
    for t in tasks {
        let day = t.created_at.with_timezone(&Local).format("%a %d %b");
        println!(
            "{:<9} {:<8} {:<7} {:<7} {:<9} {:<10} {}",
            short_id(&t.id),
            format_status(t.status),
            format_priority(t.priority),
            format_minutes(t.estimated_time),
            format_category(t.category),
            day.to_string(),
            t.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(title: &str, minutes: u32) -> TaskDraft {
        let mut d = TaskDraft::new(title);
        d.estimated_time = minutes;
        d
    }

    fn memory_store() -> TaskStore<MemorySlot> {
        TaskStore::open(MemorySlot::default(), UserStats::default())
    }

    #[test]
    fn test_add_then_lookup() {
        let mut store = memory_store();
        let id = store.add_task(draft("Gym", 60)).id.clone();

        let task = store.get(&id).unwrap();
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.title, "Gym");
        assert_eq!(store.stats().tasks_created, 1);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut store = memory_store();
        store.add_task(draft("a", 10));
        store.add_task(draft("b", 10));
        store.add_task(draft("c", 10));
        let titles: Vec<&str> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_task_at_uses_given_time() {
        let mut store = memory_store();
        let when = DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z").unwrap().with_timezone(&Utc);
        let task = store.add_task_at(draft("Plan", 30), when);
        assert_eq!(task.created_at, when);
    }

    #[test]
    fn test_complete_twice_counts_once() {
        let mut store = memory_store();
        let id = store.add_task(draft("Essay", 45)).id.clone();

        assert_eq!(store.complete_task(&id), Completion::Completed);
        assert_eq!(store.complete_task(&id), Completion::AlreadyDone);
        assert_eq!(store.stats().tasks_completed, 1);
        assert_eq!(store.stats().total_focus_time, 45);
        assert_eq!(store.get(&id).unwrap().status, Status::Done);
    }

    #[test]
    fn test_complete_after_reopen_counts_again() {
        let mut store = memory_store();
        let id = store.add_task(draft("Essay", 45)).id.clone();
        store.complete_task(&id);
        assert!(store.update_status(&id, Status::Todo));
        store.complete_task(&id);
        assert_eq!(store.stats().tasks_completed, 2);
        assert_eq!(store.stats().total_focus_time, 90);
    }

    #[test]
    fn test_complete_unknown_is_noop() {
        let mut store = memory_store();
        assert_eq!(store.complete_task("nope"), Completion::NotFound);
        assert_eq!(store.stats(), &UserStats::default());
    }

    #[test]
    fn test_update_status_allows_backward_moves() {
        let mut store = memory_store();
        let id = store.add_task(draft("Report", 30)).id.clone();
        assert!(store.update_status(&id, Status::Done));
        assert!(store.update_status(&id, Status::InProgress));
        assert_eq!(store.get(&id).unwrap().status, Status::InProgress);
        // moving into done by status does not credit stats
        assert_eq!(store.stats().tasks_completed, 0);
        assert!(!store.update_status("missing", Status::Done));
    }

    #[test]
    fn test_delete_unknown_leaves_state() {
        let mut store = memory_store();
        store.add_task(draft("Keep", 30));
        let before = store.database().clone();
        assert!(!store.delete_task("unknown"));
        assert_eq!(store.database(), &before);
    }

    #[test]
    fn test_delete_keeps_stats() {
        let mut store = memory_store();
        let id = store.add_task(draft("Done soon", 20)).id.clone();
        store.complete_task(&id);
        assert!(store.delete_task(&id));
        assert!(store.tasks().is_empty());
        assert_eq!(store.stats().tasks_completed, 1);
        assert_eq!(store.stats().total_focus_time, 20);
    }

    #[test]
    fn test_replace_all_keeps_stats_and_drops_duplicates() {
        let mut store = memory_store();
        store.add_task(draft("old", 30));
        let now = Utc::now();
        let a = Task::from_draft(draft("a", 10), now);
        let mut dup = Task::from_draft(draft("dup", 10), now);
        dup.id = a.id.clone();
        store.replace_all(vec![a.clone(), dup]);

        assert_eq!(store.tasks(), &[a]);
        assert_eq!(store.stats().tasks_created, 1);
    }

    #[test]
    fn test_state_round_trips_through_slot() {
        let slot = MemorySlot::default();
        let mut store = TaskStore::open(slot.clone(), UserStats::default());
        let id = store.add_task(draft("Gym", 60)).id.clone();
        store.add_task(draft("Read", 30));
        store.complete_task(&id);
        store.set_streak_days(4);
        let before = store.database().clone();

        let reopened = TaskStore::open(slot, UserStats::default());
        assert_eq!(reopened.database(), &before);
    }

    #[test]
    fn test_corrupt_slot_starts_fresh() {
        let slot = MemorySlot::with_contents("{ not json");
        let mut store = TaskStore::open(slot.clone(), UserStats::default());
        assert!(store.tasks().is_empty());

        store.add_task(draft("Fresh", 30));
        let saved = Database::from_json(&slot.contents().unwrap()).unwrap();
        assert_eq!(saved.tasks.len(), 1);
    }

    #[test]
    fn test_failed_write_is_not_fatal() {
        let slot = MemorySlot::default();
        let mut store = TaskStore::open(slot.clone(), UserStats::default());
        slot.set_fail_writes(true);

        store.add_task(draft("Offline", 30));
        assert_eq!(store.tasks().len(), 1);
        assert!(store.take_persist_error().is_some());
        assert!(store.take_persist_error().is_none());
        assert!(slot.contents().is_none());
    }

    #[test]
    fn test_fresh_stats_used_for_new_state() {
        let stats = UserStats {
            daily_goal_minutes: 300,
            ..UserStats::default()
        };
        let store = TaskStore::open(MemorySlot::default(), stats.clone());
        assert_eq!(store.stats(), &stats);
    }

    #[test]
    fn test_file_slot_round_trip_and_backup() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        assert!(slot.path().ends_with("focus-flow-storage.json"));

        let mut store = TaskStore::open(slot.clone(), UserStats::default());
        store.add_task(draft("Disk", 30));
        assert!(store.take_persist_error().is_none());

        let reopened = TaskStore::open(FileSlot::in_dir(dir.path()), UserStats::default());
        assert_eq!(reopened.database(), store.database());

        let backup = create_backup(slot.path()).unwrap();
        assert!(backup.starts_with(dir.path().join("backup")));
        assert_eq!(fs::read_to_string(backup).unwrap(), fs::read_to_string(slot.path()).unwrap());
    }

    #[test]
    fn test_backup_without_state_fails() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        assert!(matches!(create_backup(slot.path()), Err(StoreError::NothingToBackUp(_))));
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        fs::write(slot.path(), "[1, 2").unwrap();
        let store = TaskStore::open(slot, UserStats::default());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_resolve_task_identifier() {
        let now = Utc::now();
        let mut a = Task::from_draft(draft("Gym", 30), now);
        a.id = "aaaa1111-0000".to_string();
        let mut b = Task::from_draft(draft("Read", 30), now);
        b.id = "aaaa2222-0000".to_string();
        let tasks = vec![a, b];

        assert_eq!(resolve_task_identifier("aaaa1111-0000", &tasks).unwrap(), "aaaa1111-0000");
        assert_eq!(resolve_task_identifier("aaaa2", &tasks).unwrap(), "aaaa2222-0000");
        assert_eq!(resolve_task_identifier("gym", &tasks).unwrap(), "aaaa1111-0000");
        assert!(resolve_task_identifier("aaaa", &tasks).unwrap_err().contains("Multiple"));
        assert!(resolve_task_identifier("swim", &tasks).is_err());
    }

    #[test]
    fn test_parse_day_input() {
        // 2026-10-19 is a Monday
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);

        assert_eq!(parse_day_input("today", today), Some(today));
        assert_eq!(parse_day_input("Tomorrow", today), day(2026, 10, 20));
        assert_eq!(parse_day_input("in 3d", today), day(2026, 10, 22));
        assert_eq!(parse_day_input("in 1w", today), day(2026, 10, 26));
        assert_eq!(parse_day_input("friday", today), day(2026, 10, 23));
        assert_eq!(parse_day_input("monday", today), Some(today));
        assert_eq!(parse_day_input("next monday", today), day(2026, 10, 26));
        assert_eq!(parse_day_input("next wed", today), day(2026, 10, 28));
        assert_eq!(parse_day_input("2026-12-24", today), day(2026, 12, 24));
        assert_eq!(parse_day_input("someday", today), None);
    }

    #[test]
    fn test_parse_day_input_out_of_range() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(parse_day_input("in 99999999999d", today), None);
        assert_eq!(parse_day_input("in -99999999999w", today), None);
        assert_eq!(parse_day_input("in 9223372036854775807d", today), None);
        assert_eq!(parse_day_input("tomorrow", NaiveDate::MAX), None);
        assert_eq!(parse_day_input("next monday", NaiveDate::MAX), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
