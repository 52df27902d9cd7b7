//! Data directory resolution and the optional `config.toml`.
//!
//! All state lives in one directory: the state slot, `config.toml`, the debug
//! log and the `backup/` folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StoreError};
use crate::fields::Category;

pub const DEFAULT_DAILY_GOAL_MINUTES: u32 = 240;
pub const DEFAULT_WORKLOAD_THRESHOLD_MINUTES: u32 = 300;

pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "flow.log";

/// User-tunable settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category used when no keyword matches and no override is given.
    pub default_category: Category,
    /// Seeds the daily goal of a fresh state.
    pub daily_goal_minutes: u32,
    /// Active minutes above which the workload advisor reports overload.
    pub workload_threshold_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_category: Category::Work,
            daily_goal_minutes: DEFAULT_DAILY_GOAL_MINUTES,
            workload_threshold_minutes: DEFAULT_WORKLOAD_THRESHOLD_MINUTES,
        }
    }
}

impl Config {
    /// Read `config.toml` from the data directory. A missing file is the default config.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|source| StoreError::Config { path, source })
    }

    /// Like `load`, but a broken file is reported and replaced by defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        match Config::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default config");
                eprintln!("Warning: {e}. Using defaults.");
                Config::default()
            }
        }
    }
}

/// Pick the data directory: explicit flag/env value first, then `$HOME/.focus-flow`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".focus-flow")
}
