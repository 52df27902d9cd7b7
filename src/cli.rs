use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Plain-words task planner with a three-column board and focus timer.
/// State lives in ~/.focus-flow unless --dir or FOCUS_FLOW_DIR says otherwise.
#[derive(Parser)]
#[command(name = "flow", version, about = "Plan your day in plain words, then work it through a board")]
pub struct Cli {
    /// Data directory holding the task state, config.toml and backups.
    #[arg(long, global = true, env = "FOCUS_FLOW_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
