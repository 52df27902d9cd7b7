//! Command implementations for the CLI interface.
//!
//! Each handler works on an already opened `TaskStore`, prints its result and
//! exits with status 1 on user-facing failures.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::config::Config;
use crate::db::*;
use crate::error::StoreError;
use crate::fields::*;
use crate::insights::{category_counts, focus_hours, DailyProgress, WeekSummary, Workload};
use crate::parser::{parse_with, ParseOptions};
use crate::task::{Task, TaskDraft};
use crate::tui::board_run::run_board;

#[derive(Subcommand)]
pub enum Commands {
    /// Add tasks described in plain words, e.g. "Study HCI for 45 mins then gym".
    Add {
        /// Free text; several tasks may be joined with and/then/commas.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Force this category on every new task instead of guessing.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Plan the tasks for a day: "today", "tomorrow", "friday", "next mon", "in 3d" or YYYY-MM-DD.
        #[arg(long)]
        on: Option<String>,
    },

    /// Show how text would be split into tasks without saving anything.
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long, value_enum)]
        category: Option<Category>,
    },

    /// List tasks with optional filters.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by category.
        #[arg(long, value_enum)]
        category: Option<Category>,
    },

    /// Move a task to another column.
    Move {
        /// Task id, id prefix or title.
        task: String,
        /// todo | in-progress | done
        #[arg(value_enum)]
        status: Status,
    },

    /// Mark a task done and credit its estimate to your focus time.
    Done {
        /// Task id, id prefix or title.
        task: String,
    },

    /// Delete a task.
    Delete {
        /// Task id, id prefix or title.
        task: String,
    },

    /// Show progress and stats; optionally set streak or daily goal.
    Stats {
        /// Set the streak counter (days).
        #[arg(long)]
        streak: Option<u32>,
        /// Set the daily focus goal (minutes).
        #[arg(long)]
        goal: Option<u32>,
    },

    /// Weekly overview, Sunday to Saturday.
    Week {
        /// Weeks relative to this one; -1 is last week.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },

    /// How much planned time is still ahead of you.
    Workload,

    /// Open the three-column board.
    Board,

    /// Open the focus timer on a task.
    Focus {
        /// Task id, id prefix or title.
        task: String,
    },

    /// Export the task list as JSON.
    Export {
        /// Output file path (default: focus-flow-tasks.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace the task list with one from a JSON export.
    Import {
        /// Input JSON file path
        input: PathBuf,
        /// Skip creating a backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// Create a timestamped backup of the task state.
    Backup,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Report a write that failed after an otherwise successful command.
fn warn_if_unsaved(store: &mut TaskStore) {
    if let Some(e) = store.take_persist_error() {
        eprintln!("Warning: changes could not be saved: {e}");
    }
}

fn resolve_or_exit(store: &TaskStore, reference: &str) -> String {
    match resolve_task_identifier(reference, store.tasks()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Creation time for tasks planned on `day`: 09:00 local time.
pub fn planned_at(day: NaiveDate) -> Option<DateTime<Utc>> {
    let nine = day.and_hms_opt(9, 0, 0)?;
    Local
        .from_local_datetime(&nine)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Clamp a summed minute count into the range `format_minutes` takes.
fn saturating_minutes(minutes: u64) -> u32 {
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn parse_options(config: &Config, category: Option<Category>) -> ParseOptions {
    ParseOptions {
        default_category: config.default_category,
        category_override: category,
    }
}

fn describe_draft(draft: &TaskDraft) -> String {
    format!(
        "{}  [{} | {} | {}]",
        draft.title,
        format_category(draft.category),
        format_minutes(draft.estimated_time),
        format_priority(draft.priority)
    )
}

pub fn cmd_add(
    store: &mut TaskStore,
    config: &Config,
    text: Vec<String>,
    category: Option<Category>,
    on: Option<String>,
) {
    let created_at = match on {
        Some(day) => {
            let Some(date) = parse_day_input(&day, Local::now().date_naive()) else {
                eprintln!("Could not understand day '{day}'. Try today, tomorrow, friday, in 3d or YYYY-MM-DD.");
                std::process::exit(1);
            };
            match planned_at(date) {
                Some(t) => t,
                None => {
                    eprintln!("09:00 does not exist on {date} in the local time zone");
                    std::process::exit(1);
                }
            }
        }
        None => Utc::now(),
    };

    let drafts = parse_with(&text.join(" "), &parse_options(config, category));
    if drafts.is_empty() {
        eprintln!("Nothing to add: no task titles found in the text");
        std::process::exit(1);
    }

    println!("Added {} task(s):", drafts.len());
    for draft in drafts {
        let line = describe_draft(&draft);
        let task = store.add_task_at(draft, created_at);
        println!("  {}  {}", short_id(&task.id), line);
    }
    warn_if_unsaved(store);
}

pub fn cmd_parse(config: &Config, text: Vec<String>, category: Option<Category>) {
    let drafts = parse_with(&text.join(" "), &parse_options(config, category));
    if drafts.is_empty() {
        println!("No tasks found.");
        return;
    }
    for (i, draft) in drafts.iter().enumerate() {
        println!("{}. {}", i + 1, describe_draft(draft));
    }
}

pub fn cmd_list(store: &TaskStore, all: bool, status: Option<Status>, category: Option<Category>) {
    let tasks: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| match status {
            Some(s) => t.status == s,
            None => all || t.status != Status::Done,
        })
        .filter(|t| category.is_none() || t.category == category)
        .collect();

    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print_table(&tasks);
    }

    if category.is_some() {
        let counts: Vec<String> = category_counts(store.tasks())
            .into_iter()
            .map(|(c, n)| format!("{} {n}", format_category(Some(c))))
            .collect();
        println!();
        println!("All {} | {}", store.tasks().len(), counts.join(" | "));
    }
}

pub fn cmd_move(store: &mut TaskStore, task: String, status: Status) {
    let id = resolve_or_exit(store, &task);
    store.update_status(&id, status);
    println!("Moved {} to {}", short_id(&id), format_status(status));
    warn_if_unsaved(store);
}

pub fn cmd_done(store: &mut TaskStore, task: String) {
    let id = resolve_or_exit(store, &task);
    match store.complete_task(&id) {
        Completion::Completed => {
            let minutes = store.get(&id).map_or(0, |t| t.estimated_time);
            println!("Completed {}. {} added to your focus time.", short_id(&id), format_minutes(minutes));
        }
        Completion::AlreadyDone => println!("Task {} is already done", short_id(&id)),
        Completion::NotFound => {
            eprintln!("No task found matching '{task}'");
            std::process::exit(1);
        }
    }
    warn_if_unsaved(store);
}

pub fn cmd_delete(store: &mut TaskStore, task: String) {
    let id = resolve_or_exit(store, &task);
    let title = store.get(&id).map(|t| t.title.clone()).unwrap_or_default();
    store.delete_task(&id);
    println!("Deleted {}  {}", short_id(&id), title);
    warn_if_unsaved(store);
}

pub fn cmd_stats(store: &mut TaskStore, streak: Option<u32>, goal: Option<u32>) {
    if let Some(days) = streak {
        store.set_streak_days(days);
    }
    if let Some(minutes) = goal {
        store.set_daily_goal(minutes);
    }
    warn_if_unsaved(store);

    let progress = DailyProgress::from_tasks(store.tasks());
    let stats = store.stats();
    println!("Progress:       {}/{} done ({}%)", progress.completed, progress.total, progress.percent);
    println!("Focus time:     {}h ({} min)", focus_hours(stats), stats.total_focus_time);
    println!("Streak:         {} day(s)", stats.streak_days);
    println!("Daily goal:     {}", format_minutes(stats.daily_goal_minutes));
    println!("Tasks created:  {}", stats.tasks_created);
    println!("Tasks finished: {}", stats.tasks_completed);
}

pub fn cmd_week(store: &TaskStore, offset: i64) {
    let today = Local::now().date_naive();
    let Some(anchor) = Duration::try_weeks(offset).and_then(|w| today.checked_add_signed(w)) else {
        eprintln!("Week offset {offset} is out of range");
        std::process::exit(1);
    };
    let week = WeekSummary::build(store.tasks(), anchor, &Local);

    println!("Week of {} to {}", week.start.format("%d %b"), week.end().format("%d %b %Y"));
    println!();
    for day in &week.days {
        let marker = if day.date == today { "*" } else { " " };
        let load = if day.tasks.is_empty() {
            "free".to_string()
        } else {
            format!("{} task(s), {}", day.tasks.len(), format_minutes(saturating_minutes(day.minutes())))
        };
        println!("{marker} {:<10} {load}", day.date.format("%a %d"));
    }
    println!();
    println!("Total:    {} task(s), ~{}h estimated", week.total_tasks(), week.total_hours());
    match week.busiest_day() {
        Some(day) => println!("Busiest:  {}", day.date.format("%A")),
        None => println!("Busiest:  -"),
    }
    println!("Free days: {}", week.free_days());
}

pub fn cmd_workload(store: &TaskStore, config: &Config) {
    let workload = Workload::assess(store.tasks(), config.workload_threshold_minutes);
    println!("{}", workload.headline());
    println!(
        "{} active task(s), {} planned",
        workload.active_tasks,
        format_minutes(saturating_minutes(workload.active_minutes))
    );
    println!("{}", workload.advice());
}

pub fn cmd_board(store: TaskStore, config: Config, focus: Option<String>) {
    let focus = focus.map(|reference| resolve_or_exit(&store, &reference));
    if let Err(e) = run_board(store, config, focus.as_deref()) {
        eprintln!("Board error: {e}");
        std::process::exit(1);
    }
}

pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

pub fn cmd_export(store: &TaskStore, output: Option<PathBuf>) {
    let output_path = output.unwrap_or_else(|| PathBuf::from("focus-flow-tasks.json"));
    let json = match serde_json::to_string_pretty(store.tasks()) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize tasks: {e}");
            std::process::exit(1);
        }
    };
    match fs::write(&output_path, json) {
        Ok(()) => println!("Exported {} task(s) to {}", store.tasks().len(), output_path.display()),
        Err(e) => {
            eprintln!("Failed to write {}: {e}", output_path.display());
            std::process::exit(1);
        }
    }
}

/// Read tasks from an export: either a bare task array or a whole saved state.
pub fn read_import(text: &str) -> Result<Vec<Task>, StoreError> {
    match serde_json::from_str::<Vec<Task>>(text) {
        Ok(tasks) => Ok(tasks),
        Err(_) => Ok(Database::from_json(text)?.tasks),
    }
}

pub fn cmd_import(store: &mut TaskStore, input: PathBuf, no_backup: bool) {
    let text = match fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read '{}': {e}", input.display());
            std::process::exit(1);
        }
    };
    let tasks = match read_import(&text) {
        Ok(tasks) => tasks,
        Err(e) => {
            eprintln!("'{}' is not a task export: {e}", input.display());
            std::process::exit(1);
        }
    };

    if !no_backup && !take_backup_before_import(store.slot().path()) {
        println!("Import cancelled.");
        return;
    }

    store.replace_all(tasks);
    println!("Imported {} task(s) from {}", store.tasks().len(), input.display());
    warn_if_unsaved(store);
}

/// Back up the current state. Returns whether the import should go ahead.
fn take_backup_before_import(state_path: &Path) -> bool {
    match create_backup(state_path) {
        Ok(backup_path) => {
            println!("Created backup: {}", backup_path.display());
            true
        }
        Err(StoreError::NothingToBackUp(_)) => true,
        Err(e) => {
            eprintln!("Warning: Failed to create backup: {e}");
            print!("Continue without backup? (y/N): ");
            if io::stdout().flush().is_err() {
                return false;
            }
            let mut response = String::new();
            io::stdin().read_line(&mut response).is_ok() && response.trim().to_lowercase().starts_with('y')
        }
    }
}

pub fn cmd_backup(store: &TaskStore) {
    match create_backup(store.slot().path()) {
        Ok(backup_path) => println!("Created backup: {}", backup_path.display()),
        Err(e) => {
            eprintln!("Backup failed: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::UserStats;
    use chrono::Timelike;

    #[test]
    fn test_planned_at_is_nine_local() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();
        let at = planned_at(day).unwrap().with_timezone(&Local);
        assert_eq!(at.date_naive(), day);
        assert_eq!((at.hour(), at.minute()), (9, 0));
    }

    #[test]
    fn test_read_import_accepts_both_shapes() {
        let task = Task::from_draft(TaskDraft::new("Gym"), Utc::now());
        let bare = serde_json::to_string(&vec![task.clone()]).unwrap();
        assert_eq!(read_import(&bare).unwrap(), vec![task.clone()]);

        let mut db = Database::with_stats(UserStats::default());
        db.tasks.push(task.clone());
        assert_eq!(read_import(&db.to_json().unwrap()).unwrap(), vec![task]);

        assert!(read_import("{ not json").is_err());
    }

    #[test]
    fn test_saturating_minutes() {
        assert_eq!(saturating_minutes(90), 90);
        assert_eq!(saturating_minutes(u64::from(u32::MAX) + 1), u32::MAX);
    }

    #[test]
    fn test_parse_options_follow_config() {
        let config = Config {
            default_category: Category::Personal,
            ..Config::default()
        };
        let options = parse_options(&config, Some(Category::Health));
        assert_eq!(options.default_category, Category::Personal);
        assert_eq!(options.category_override, Some(Category::Health));
    }
}
