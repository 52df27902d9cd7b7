//! Task records and the aggregate user statistics stored beside them.
//!
//! A `TaskDraft` is what the parser produces from free text. The store turns a
//! draft into a `Task` by assigning an id, a creation time and the initial
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::*;

/// A unit of work on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    /// Planning estimate in minutes; also the default focus session length.
    pub estimated_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Creation time. Weekly views also read it as the day the task is planned for.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a fresh `todo` task from a draft.
    pub fn from_draft(draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            status: Status::Todo,
            priority: draft.priority,
            estimated_time: draft.estimated_time.max(1),
            category: draft.category,
            created_at,
        }
    }

    /// Whether the task still counts towards the planned workload.
    pub fn is_active(&self) -> bool {
        self.status != Status::Done
    }
}

/// A parsed task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub priority: Priority,
    pub estimated_time: u32,
    pub category: Option<Category>,
}

impl TaskDraft {
    /// A draft with the default priority and estimate.
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            priority: Priority::Medium,
            estimated_time: crate::parser::DEFAULT_ESTIMATE_MINUTES,
            category: None,
        }
    }
}

/// Running totals kept alongside the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Minutes credited by completed tasks. Never decreases.
    pub total_focus_time: u64,
    pub tasks_completed: u64,
    pub tasks_created: u64,
    pub streak_days: u32,
    pub daily_goal_minutes: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        UserStats {
            total_focus_time: 0,
            tasks_completed: 0,
            tasks_created: 0,
            streak_days: 1,
            daily_goal_minutes: crate::config::DEFAULT_DAILY_GOAL_MINUTES,
        }
    }
}
