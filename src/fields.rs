//! Enumerations and field types for tasks.
//!
//! This module defines the structured values a task carries: its board status,
//! its priority, and the life-area category the parser infers from free text.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    #[serde(alias = "in_progress")]
    #[value(alias = "in_progress")]
    InProgress,
    Done,
}

impl Status {
    /// All statuses in board order, left to right.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    /// Column position on the board.
    pub fn column(self) -> usize {
        match self {
            Status::Todo => 0,
            Status::InProgress => 1,
            Status::Done => 2,
        }
    }

    /// Status for a board column, if the column exists.
    pub fn from_column(column: usize) -> Option<Status> {
        Status::ALL.get(column).copied()
    }
}

/// Informational priority. Has no effect on ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Life area a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Work,
    Personal,
    Study,
    Health,
    Career,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Study,
        Category::Career,
        Category::Personal,
        Category::Health,
    ];
}

/// Format a task status for display using the board's column names.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "On Deck",
        Status::InProgress => "In Flow",
        Status::Done => "Done",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

/// Format a category for display; `None` is an uncategorised task.
pub fn format_category(c: Option<Category>) -> &'static str {
    match c {
        Some(Category::Work) => "Work",
        Some(Category::Personal) => "Personal",
        Some(Category::Study) => "Study",
        Some(Category::Health) => "Health",
        Some(Category::Career) => "Career",
        None => "-",
    }
}

/// Format a minute count the way cards show it ("45m", "1h", "1h 30m").
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Format a second count as a `MM:SS` countdown.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_columns() {
        for status in Status::ALL {
            assert_eq!(Status::from_column(status.column()), Some(status));
        }
        assert_eq!(Status::from_column(3), None);
    }

    #[test]
    fn test_status_accepts_underscore_alias() {
        let s: Status = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, Status::InProgress);
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in-progress\"");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h");
        assert_eq!(format_minutes(90), "1h 30m");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(1500), "25:00");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(6000), "100:00");
    }
}
