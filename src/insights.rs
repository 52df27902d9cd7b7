//! Read-only views derived from the task list: workload advice, daily
//! progress, the weekly grid and per-category counts.

use chrono::{Datelike, Duration, NaiveDate, TimeZone};

use crate::fields::{Category, Status};
use crate::task::{Task, UserStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadLevel {
    /// Nothing left to do.
    Empty,
    OnTrack,
    Overloaded,
}

/// Planned minutes still ahead, summed over every task not yet done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub active_tasks: usize,
    pub active_minutes: u64,
    pub level: WorkloadLevel,
}

impl Workload {
    /// Overloaded when the rounded hours shown to the user exceed the threshold.
    pub fn assess(tasks: &[Task], threshold_minutes: u32) -> Self {
        let active: Vec<&Task> = tasks.iter().filter(|t| t.is_active()).collect();
        let active_minutes: u64 = active.iter().map(|t| u64::from(t.estimated_time)).sum();
        let level = if active.is_empty() {
            WorkloadLevel::Empty
        } else if rounded_hours(active_minutes) > f64::from(threshold_minutes) / 60.0 {
            WorkloadLevel::Overloaded
        } else {
            WorkloadLevel::OnTrack
        };
        Workload {
            active_tasks: active.len(),
            active_minutes,
            level,
        }
    }

    /// Active time in hours, rounded to one decimal.
    pub fn hours(&self) -> f64 {
        rounded_hours(self.active_minutes)
    }

    pub fn headline(&self) -> &'static str {
        match self.level {
            WorkloadLevel::Empty => "Nothing planned",
            WorkloadLevel::OnTrack => "On Track",
            WorkloadLevel::Overloaded => "Workload High",
        }
    }

    pub fn advice(&self) -> String {
        match self.level {
            WorkloadLevel::Empty => "Add a few tasks to plan your day.".to_string(),
            WorkloadLevel::OnTrack => {
                format!("You have {} hours planned. A perfectly balanced day.", self.hours())
            }
            WorkloadLevel::Overloaded => format!(
                "You have {} hours planned. That's a lot! Consider moving some tasks to tomorrow.",
                self.hours()
            ),
        }
    }
}

fn rounded_hours(minutes: u64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

/// Completed share of the whole board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    pub total: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent; 0 for an empty board.
    pub percent: u32,
}

impl DailyProgress {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.status == Status::Done).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        DailyProgress {
            total,
            completed,
            percent,
        }
    }
}

/// Whole hours of focus credited so far.
pub fn focus_hours(stats: &UserStats) -> u64 {
    (stats.total_focus_time as f64 / 60.0).round() as u64
}

/// Sunday on or before `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

#[derive(Debug, Clone)]
pub struct DaySummary<'a> {
    pub date: NaiveDate,
    pub tasks: Vec<&'a Task>,
}

impl DaySummary<'_> {
    pub fn minutes(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.estimated_time)).sum()
    }
}

/// Sunday-to-Saturday view of tasks, keyed by the local day of `created_at`.
#[derive(Debug, Clone)]
pub struct WeekSummary<'a> {
    pub start: NaiveDate,
    pub days: Vec<DaySummary<'a>>,
}

impl<'a> WeekSummary<'a> {
    /// Build the week containing `anchor`, reading creation times in `tz`.
    pub fn build<Tz: TimeZone>(tasks: &'a [Task], anchor: NaiveDate, tz: &Tz) -> Self {
        let start = week_start(anchor);
        let mut days: Vec<DaySummary<'a>> = (0..7)
            .map(|i| DaySummary {
                date: start + Duration::days(i),
                tasks: Vec::new(),
            })
            .collect();

        for task in tasks {
            let day = task.created_at.with_timezone(tz).date_naive();
            let offset = (day - start).num_days();
            if (0..7).contains(&offset) {
                days[offset as usize].tasks.push(task);
            }
        }

        WeekSummary { start, days }
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn total_tasks(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }

    pub fn total_minutes(&self) -> u64 {
        self.days.iter().map(DaySummary::minutes).sum()
    }

    /// Estimated hours for the week, rounded to a whole hour.
    pub fn total_hours(&self) -> u64 {
        (self.total_minutes() as f64 / 60.0).round() as u64
    }

    /// First day holding the most tasks; `None` for an empty week.
    pub fn busiest_day(&self) -> Option<&DaySummary<'a>> {
        let mut best: Option<&DaySummary<'a>> = None;
        for day in &self.days {
            if day.tasks.is_empty() {
                continue;
            }
            match best {
                Some(b) if b.tasks.len() >= day.tasks.len() => {}
                _ => best = Some(day),
            }
        }
        best
    }

    pub fn free_days(&self) -> usize {
        self.days.iter().filter(|d| d.tasks.is_empty()).count()
    }
}

/// Task count per category, in filter-bar order. Uncategorised tasks only
/// show up in the overall total.
pub fn category_counts(tasks: &[Task]) -> Vec<(Category, usize)> {
    Category::ALL
        .iter()
        .map(|&c| (c, tasks.iter().filter(|t| t.category == Some(c)).count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::{DateTime, Utc};

    fn task(title: &str, minutes: u32, status: Status, created: &str) -> Task {
        let mut draft = TaskDraft::new(title);
        draft.estimated_time = minutes;
        let created: DateTime<Utc> = DateTime::parse_from_rfc3339(created).unwrap().with_timezone(&Utc);
        let mut t = Task::from_draft(draft, created);
        t.status = status;
        t
    }

    #[test]
    fn test_workload_levels() {
        assert_eq!(Workload::assess(&[], 300).level, WorkloadLevel::Empty);

        let tasks = vec![
            task("a", 120, Status::Todo, "2026-10-19T09:00:00Z"),
            task("b", 180, Status::InProgress, "2026-10-19T09:00:00Z"),
            task("c", 600, Status::Done, "2026-10-19T09:00:00Z"),
        ];
        let w = Workload::assess(&tasks, 300);
        assert_eq!(w.active_minutes, 300);
        assert_eq!(w.active_tasks, 2);
        assert_eq!(w.level, WorkloadLevel::OnTrack);
        assert_eq!(w.hours(), 5.0);

        let w = Workload::assess(&tasks, 299);
        assert_eq!(w.level, WorkloadLevel::Overloaded);
        assert!(w.advice().contains("5 hours"));
    }

    #[test]
    fn test_workload_level_matches_shown_hours() {
        let tasks = vec![task("a", 302, Status::Todo, "2026-10-19T09:00:00Z")];
        let w = Workload::assess(&tasks, 300);
        assert_eq!(w.hours(), 5.0);
        assert_eq!(w.level, WorkloadLevel::OnTrack);

        let tasks = vec![task("a", 305, Status::Todo, "2026-10-19T09:00:00Z")];
        let w = Workload::assess(&tasks, 300);
        assert_eq!(w.hours(), 5.1);
        assert_eq!(w.level, WorkloadLevel::Overloaded);
    }

    #[test]
    fn test_workload_hours_rounding() {
        let tasks = vec![task("a", 100, Status::Todo, "2026-10-19T09:00:00Z")];
        assert_eq!(Workload::assess(&tasks, 300).hours(), 1.7);
    }

    #[test]
    fn test_daily_progress() {
        assert_eq!(DailyProgress::from_tasks(&[]).percent, 0);
        let tasks = vec![
            task("a", 30, Status::Done, "2026-10-19T09:00:00Z"),
            task("b", 30, Status::Todo, "2026-10-19T09:00:00Z"),
            task("c", 30, Status::Todo, "2026-10-19T09:00:00Z"),
        ];
        let p = DailyProgress::from_tasks(&tasks);
        assert_eq!((p.completed, p.total, p.percent), (1, 3, 33));
    }

    #[test]
    fn test_focus_hours_rounds() {
        let stats = UserStats {
            total_focus_time: 150,
            ..UserStats::default()
        };
        assert_eq!(focus_hours(&stats), 3);
    }

    #[test]
    fn test_week_starts_on_sunday() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(week_start(monday), sunday);
        assert_eq!(week_start(sunday), sunday);
    }

    #[test]
    fn test_week_summary() {
        let tasks = vec![
            task("sun", 60, Status::Todo, "2026-10-18T10:00:00Z"),
            task("tue1", 30, Status::Todo, "2026-10-20T10:00:00Z"),
            task("tue2", 45, Status::Done, "2026-10-20T18:00:00Z"),
            task("sat", 30, Status::Todo, "2026-10-24T23:59:00Z"),
            task("next week", 30, Status::Todo, "2026-10-25T00:00:00Z"),
            task("last week", 30, Status::Todo, "2026-10-17T23:59:00Z"),
        ];
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let week = WeekSummary::build(&tasks, anchor, &Utc);

        assert_eq!(week.start, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(week.end(), NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
        assert_eq!(week.total_tasks(), 4);
        assert_eq!(week.total_minutes(), 165);
        assert_eq!(week.total_hours(), 3);
        assert_eq!(week.free_days(), 4);

        let busiest = week.busiest_day().unwrap();
        assert_eq!(busiest.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(busiest.minutes(), 75);
    }

    #[test]
    fn test_busiest_day_ties_pick_first() {
        let tasks = vec![
            task("mon", 30, Status::Todo, "2026-10-19T10:00:00Z"),
            task("thu", 30, Status::Todo, "2026-10-22T10:00:00Z"),
        ];
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let week = WeekSummary::build(&tasks, anchor, &Utc);
        assert_eq!(week.busiest_day().unwrap().date, anchor);
    }

    #[test]
    fn test_empty_week_has_no_busiest_day() {
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let week = WeekSummary::build(&[], anchor, &Utc);
        assert!(week.busiest_day().is_none());
        assert_eq!(week.free_days(), 7);
    }

    #[test]
    fn test_category_counts() {
        let mut a = task("a", 30, Status::Todo, "2026-10-19T10:00:00Z");
        a.category = Some(Category::Health);
        let mut b = task("b", 30, Status::Todo, "2026-10-19T10:00:00Z");
        b.category = Some(Category::Health);
        let c = task("c", 30, Status::Todo, "2026-10-19T10:00:00Z");

        let counts = category_counts(&[a, b, c]);
        assert_eq!(counts.len(), Category::ALL.len());
        assert!(counts.contains(&(Category::Health, 2)));
        assert!(counts.contains(&(Category::Work, 0)));
    }
}
