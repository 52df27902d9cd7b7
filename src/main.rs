//! # Focus Flow
//!
//! A terminal day planner. Type what you need to do in plain words and it is
//! split into tasks with a guessed category, priority and time estimate:
//!
//! ```bash
//! flow add "Study HCI for 45 mins, gym then call mom asap"
//! flow list
//! flow board
//! ```
//!
//! ## Key Commands
//!
//! - `flow add <text>` - Add tasks from free text (`--on friday` to plan ahead)
//! - `flow parse <text>` - Preview how text would be split, without saving
//! - `flow board` - Three-column board (On Deck / In Flow / Done) with a focus timer
//! - `flow focus <task>` - Jump straight into a focus session on one task
//! - `flow done <task>` - Complete a task and credit its estimate to your focus time
//! - `flow week` / `flow workload` / `flow stats` - Weekly overview, load check, progress
//! - `flow export` / `flow import` / `flow backup` - JSON export and timestamped backups
//!
//! State is kept in `~/.focus-flow/focus-flow-storage.json` (override with
//! `--dir` or `FOCUS_FLOW_DIR`). An optional `config.toml` in the same folder
//! sets the default category, the daily goal and the workload threshold.
//! Set `FOCUS_FLOW_LOG=focus_flow=debug` to write a debug log to `flow.log`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod focus;
pub mod insights;
pub mod parser;
pub mod task;
pub mod tui {
    pub mod board;
    pub mod board_run;
    pub mod colors;
    pub mod input;
}

use cli::Cli;
use cmd::*;
use config::{resolve_data_dir, Config, LOG_FILE};
use db::{FileSlot, TaskStore};
use task::UserStats;

/// Log to `<dir>/flow.log` when `FOCUS_FLOW_LOG` holds a filter directive.
/// Stdout stays untouched so the board's alternate screen is never garbled.
fn init_logging(dir: &Path) {
    let Ok(directive) = std::env::var("FOCUS_FLOW_LOG") else {
        return;
    };
    let file = match OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file: {e}");
            return;
        }
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Commands that never touch the data directory
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let data_dir = resolve_data_dir(cli.dir.as_deref());
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    init_logging(&data_dir);

    let config = Config::load_or_default(&data_dir);
    tracing::debug!(dir = %data_dir.display(), "starting");

    if let Commands::Parse { text, category } = cli.command {
        cmd_parse(&config, text, category);
        return;
    }

    let fresh_stats = UserStats {
        daily_goal_minutes: config.daily_goal_minutes,
        ..UserStats::default()
    };
    let mut store = TaskStore::open(FileSlot::in_dir(&data_dir), fresh_stats);

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),
        Commands::Parse { .. } => unreachable!("parse handled above"),

        Commands::Add { text, category, on } => cmd_add(&mut store, &config, text, category, on),

        Commands::List { all, status, category } => cmd_list(&store, all, status, category),

        Commands::Move { task, status } => cmd_move(&mut store, task, status),

        Commands::Done { task } => cmd_done(&mut store, task),

        Commands::Delete { task } => cmd_delete(&mut store, task),

        Commands::Stats { streak, goal } => cmd_stats(&mut store, streak, goal),

        Commands::Week { offset } => cmd_week(&store, offset),

        Commands::Workload => cmd_workload(&store, &config),

        Commands::Board => cmd_board(store, config, None),

        Commands::Focus { task } => cmd_board(store, config, Some(task)),

        Commands::Export { output } => cmd_export(&store, output),

        Commands::Import { input, no_backup } => cmd_import(&mut store, input, no_backup),

        Commands::Backup => cmd_backup(&store),
    }
}
