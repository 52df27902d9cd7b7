//! Focus sessions: a countdown bound to one task.
//!
//! The session never owns the task. It keeps the id and re-checks it against
//! the store on every read, so deleting the task underneath a session drops it
//! back to idle. Ticks come from a `Ticker` that only exists while the timer
//! runs; leaving `Running` drops it, which cancels any pending ticks.

use std::time::{Duration, Instant};

use crate::db::{Completion, Slot, TaskStore};

const TICK: Duration = Duration::from_secs(1);

/// Observable phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Idle,
    Paused,
    Running,
    Expired,
}

/// Schedule of one-second ticks anchored at the moment the timer started.
#[derive(Debug, Clone)]
pub struct Ticker {
    next_due: Instant,
}

impl Ticker {
    pub fn starting_at(now: Instant) -> Self {
        Ticker { next_due: now + TICK }
    }

    /// Number of whole ticks that fell due up to `now`; advances the schedule.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut due = 0;
        while now >= self.next_due {
            due += 1;
            self.next_due += TICK;
        }
        due
    }

    /// Time left until the next tick falls due.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[derive(Debug, Default)]
pub struct FocusSession {
    active_task_id: Option<String>,
    visible: bool,
    remaining_seconds: u32,
    ticker: Option<Ticker>,
}

impl FocusSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the session to a task and reset the countdown to its estimate.
    /// Rebinding while running also resets. Unknown ids are ignored.
    pub fn select_task<S: Slot>(&mut self, store: &TaskStore<S>, id: &str) -> bool {
        let Some(task) = store.get(id) else {
            return false;
        };
        self.active_task_id = Some(task.id.clone());
        self.remaining_seconds = task.estimated_time.saturating_mul(60);
        self.ticker = None;
        self.visible = true;
        tracing::debug!(id, seconds = self.remaining_seconds, "focus session bound");
        true
    }

    /// Start counting down. No-op unless paused with time left.
    pub fn start(&mut self, now: Instant) {
        if self.active_task_id.is_none() || self.ticker.is_some() || self.remaining_seconds == 0 {
            return;
        }
        self.ticker = Some(Ticker::starting_at(now));
    }

    /// Stop counting down, keeping the remaining time.
    pub fn pause(&mut self) {
        self.ticker = None;
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.pause();
        } else {
            self.start(now);
        }
    }

    /// One elapsed second. Reaching zero expires the session and cancels the ticker.
    pub fn tick(&mut self) {
        if self.ticker.is_none() {
            return;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.ticker = None;
            tracing::debug!("focus session expired");
        }
    }

    /// Deliver every tick that fell due up to `now`.
    pub fn advance(&mut self, now: Instant) {
        let due = match self.ticker.as_mut() {
            Some(ticker) => ticker.due_ticks(now),
            None => return,
        };
        for _ in 0..due {
            if self.ticker.is_none() {
                break;
            }
            self.tick();
        }
    }

    /// Complete the bound task in the store and return to idle.
    pub fn complete<S: Slot>(&mut self, store: &mut TaskStore<S>) -> Option<Completion> {
        let id = self.active_task_id.take()?;
        let outcome = store.complete_task(&id);
        self.clear();
        Some(outcome)
    }

    /// Hide the full-screen view. Binding and timer carry on.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Bring the full-screen view back, if a task is bound.
    pub fn show(&mut self) {
        if self.active_task_id.is_some() {
            self.visible = true;
        }
    }

    /// Drop the binding if its task no longer exists.
    pub fn reconcile<S: Slot>(&mut self, store: &TaskStore<S>) {
        if let Some(id) = &self.active_task_id {
            if store.get(id).is_none() {
                tracing::debug!(id = %id, "bound task is gone, session reset");
                self.clear();
            }
        }
    }

    pub fn state<S: Slot>(&self, store: &TaskStore<S>) -> FocusState {
        match &self.active_task_id {
            Some(id) if store.get(id).is_some() => {
                if self.ticker.is_some() {
                    FocusState::Running
                } else if self.remaining_seconds == 0 {
                    FocusState::Expired
                } else {
                    FocusState::Paused
                }
            }
            _ => FocusState::Idle,
        }
    }

    /// Whether the full-screen view should be drawn.
    pub fn is_presentable<S: Slot>(&self, store: &TaskStore<S>) -> bool {
        self.visible && self.state(store) != FocusState::Idle
    }

    /// Whether the minimised countdown should be drawn instead.
    pub fn is_minimised<S: Slot>(&self, store: &TaskStore<S>) -> bool {
        !self.visible && self.state(store) != FocusState::Idle
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// How long the event loop may wait before the next tick is due.
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.ticker.as_ref().map(|t| t.until_next(now))
    }

    fn clear(&mut self) {
        self.active_task_id = None;
        self.visible = false;
        self.remaining_seconds = 0;
        self.ticker = None;
    }
}
