//! Three-column board with the focus overlay.
//!
//! Cards sit in On Deck / In Flow / Done by status, in insertion order. Moving a
//! card across columns is a status update; the focus overlay drives a
//! `FocusSession` bound to one card and shrinks to a one-line countdown when
//! dismissed.

use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::config::Config;
use crate::db::{short_id, truncate, Completion, FileSlot, Slot, TaskStore};
use crate::fields::*;
use crate::focus::{FocusSession, FocusState};
use crate::insights::{DailyProgress, Workload, WorkloadLevel};
use crate::parser::{parse_with, ParseOptions};
use crate::task::Task;
use crate::tui::colors::{category_color, priority_color, CALM_GREEN, FOCUS_BLUE, SLATE, WARN_ORANGE};
use crate::tui::input::InputField;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const CARD_HEIGHT: usize = 5;

/// Board state: the store, the focus session and what the cursor is on.
pub struct BoardApp<S: Slot = FileSlot> {
    store: TaskStore<S>,
    session: FocusSession,
    config: Config,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; 3],
    status_message: String,
    show_task_detail: bool,
    category_filter: Option<Category>,
    add_input: Option<InputField>,
    pending_delete: Option<String>,
    columns: [Vec<String>; 3],
}

impl<S: Slot> BoardApp<S> {
    pub fn new(store: TaskStore<S>, config: Config) -> Self {
        let mut app = BoardApp {
            store,
            session: FocusSession::new(),
            config,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; 3],
            status_message: String::new(),
            show_task_detail: false,
            category_filter: None,
            add_input: None,
            pending_delete: None,
            columns: Default::default(),
        };
        app.update_columns();
        app
    }

    /// Open the board with the focus overlay already bound to `task_id`.
    pub fn with_focus(store: TaskStore<S>, config: Config, task_id: &str) -> Self {
        let mut app = BoardApp::new(store, config);
        if app.session.select_task(&app.store, task_id) {
            app.select_task_card(task_id);
        }
        app
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Rebuild the columns from the store, applying the category filter.
    fn update_columns(&mut self) {
        for column in self.columns.iter_mut() {
            column.clear();
        }
        for task in self.store.tasks() {
            if let Some(filter) = self.category_filter {
                if task.category != Some(filter) {
                    continue;
                }
            }
            self.columns[task.status.column()].push(task.id.clone());
        }
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }
        let column_len = self.columns[self.selected_column].len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    fn selected_task_id(&self) -> Option<String> {
        self.columns[self.selected_column].get(self.selected_card).cloned()
    }

    /// Put the cursor on a task's card, wherever it now lives.
    fn select_task_card(&mut self, id: &str) {
        for (column_index, column) in self.columns.iter().enumerate() {
            if let Some(position) = column.iter().position(|c| c == id) {
                self.selected_column = column_index;
                self.selected_card = position;
                return;
            }
        }
        self.clamp_selection();
    }

    /// Refresh after a store mutation and surface a failed write.
    fn after_mutation(&mut self, message: String) {
        self.update_columns();
        self.session.reconcile(&self.store);
        self.status_message = match self.store.take_persist_error() {
            Some(e) => format!("{message} (not saved: {e})"),
            None => message,
        };
    }

    /// Move the selected card one column left or right.
    fn move_card(&mut self, forward: bool) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        let target = if forward {
            self.selected_column + 1
        } else {
            match self.selected_column.checked_sub(1) {
                Some(c) => c,
                None => return,
            }
        };
        let Some(status) = Status::from_column(target) else {
            return;
        };
        if self.store.update_status(&task_id, status) {
            self.after_mutation(format!("Moved task to {}", format_status(status)));
            self.select_task_card(&task_id);
        }
    }

    fn complete_selected(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        let message = match self.store.complete_task(&task_id) {
            Completion::Completed => "Task completed".to_string(),
            Completion::AlreadyDone => "Task was already done".to_string(),
            Completion::NotFound => return,
        };
        self.after_mutation(message);
        self.select_task_card(&task_id);
    }

    fn delete_task(&mut self, task_id: &str) {
        if self.store.delete_task(task_id) {
            self.after_mutation("Task deleted".to_string());
        }
    }

    fn submit_new_tasks(&mut self, text: &str) {
        let options = ParseOptions {
            default_category: self.config.default_category,
            category_override: self.category_filter,
        };
        let drafts = parse_with(text, &options);
        if drafts.is_empty() {
            self.status_message = "Nothing to add".to_string();
            return;
        }
        let count = drafts.len();
        for draft in drafts {
            self.store.add_task(draft);
        }
        self.after_mutation(format!("Added {count} task(s)"));
    }

    fn cycle_category_filter(&mut self) {
        self.category_filter = match self.category_filter {
            None => Some(Category::ALL[0]),
            Some(current) => Category::ALL
                .iter()
                .position(|&c| c == current)
                .and_then(|i| Category::ALL.get(i + 1).copied()),
        };
        self.update_columns();
        self.status_message = match self.category_filter {
            Some(c) => format!("Showing {} tasks", format_category(Some(c))),
            None => "Showing all tasks".to_string(),
        };
    }

    /// Bind the focus session to the selected card, or re-open the bound one.
    fn open_focus(&mut self) {
        let selected = self.selected_task_id();
        let bound = self.session.active_task_id().map(str::to_string);
        match (selected, bound) {
            (Some(selected), Some(bound)) if selected == bound => self.session.show(),
            (Some(selected), _) => {
                self.session.select_task(&self.store, &selected);
            }
            (None, Some(_)) => self.session.show(),
            (None, None) => self.status_message = "Select a task to focus on".to_string(),
        }
    }

    /// Apply one key press. Returns `true` when the board should close.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        self.session.reconcile(&self.store);

        if self.add_input.is_some() {
            self.handle_add_input(key);
            return false;
        }

        if let Some(task_id) = self.pending_delete.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.delete_task(&task_id),
                _ => self.status_message = "Delete cancelled".to_string(),
            }
            return false;
        }

        if self.session.is_presentable(&self.store) {
            return self.handle_focus_key(key, now);
        }

        self.status_message.clear();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return true,

            KeyCode::Enter => {
                self.show_task_detail = !self.show_task_detail;
            }

            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(false),
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(true),
            KeyCode::Char('<') => self.move_card(false),
            KeyCode::Char('>') => self.move_card(true),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column < self.columns.len() - 1 {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down => {
                let column_len = self.columns[self.selected_column].len();
                if column_len > 0 && self.selected_card < column_len - 1 {
                    self.selected_card += 1;
                }
            }

            KeyCode::Char('a') => {
                self.add_input = Some(InputField::new());
                self.status_message =
                    "Describe your tasks (e.g. 'Study HCI for 45 mins, gym then call mom')".to_string();
            }
            KeyCode::Char('c') => self.complete_selected(),
            KeyCode::Char('x') => {
                if let Some(task_id) = self.selected_task_id() {
                    let title = self.store.get(&task_id).map(|t| t.title.clone()).unwrap_or_default();
                    self.status_message = format!("Delete '{}'? (y/N)", truncate(&title, 40));
                    self.pending_delete = Some(task_id);
                }
            }
            KeyCode::Char('/') => self.cycle_category_filter(),
            KeyCode::Char('f') => self.open_focus(),
            KeyCode::Char('h') => {
                self.status_message = "←/→/↑/↓: Select | Ctrl+←/→ or </>: Move | a: Add | c: Complete | x: Delete | f: Focus | /: Category | Enter: Details | q: Quit".to_string();
            }
            _ => {}
        }
        false
    }

    fn handle_add_input(&mut self, key: KeyEvent) {
        let Some(input) = self.add_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.add_input = None;
                self.status_message.clear();
            }
            KeyCode::Enter => {
                let text = input.take();
                self.add_input = None;
                self.submit_new_tasks(&text);
            }
            KeyCode::Backspace => input.handle_backspace(),
            KeyCode::Delete => input.handle_delete(),
            KeyCode::Left => input.move_cursor_left(),
            KeyCode::Right => input.move_cursor_right(),
            KeyCode::Char(c) => input.handle_char(c),
            _ => {}
        }
    }

    fn handle_focus_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(' ') | KeyCode::Char('p') => self.session.toggle(now),
            KeyCode::Char('c') => {
                let Some(id) = self.session.active_task_id().map(str::to_string) else {
                    return false;
                };
                let message = match self.session.complete(&mut self.store) {
                    Some(Completion::Completed) => "Task completed. Nice focus!",
                    Some(Completion::AlreadyDone) => "Task was already done",
                    Some(Completion::NotFound) | None => "Task no longer exists",
                };
                self.after_mutation(message.to_string());
                self.select_task_card(&id);
            }
            KeyCode::Esc => self.session.dismiss(),
            _ => {}
        }
        false
    }

    /// Render the whole screen.
    fn render(&mut self, f: &mut Frame) {
        let minimised = self.session.is_minimised(&self.store);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(if minimised { 1 } else { 0 }),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        if minimised {
            self.render_minimised_timer(f, chunks[2]);
        }
        self.render_status_bar(f, chunks[3]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
        if self.session.is_presentable(&self.store) {
            self.render_focus_overlay(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let progress = DailyProgress::from_tasks(self.store.tasks());
        let workload = Workload::assess(self.store.tasks(), self.config.workload_threshold_minutes);
        let workload_color = match workload.level {
            WorkloadLevel::Overloaded => WARN_ORANGE,
            _ => CALM_GREEN,
        };
        let filter = match self.category_filter {
            Some(c) => format!("  [{}]", format_category(Some(c))),
            None => String::new(),
        };

        let header_text = vec![Line::from(vec![
            Span::styled("FOCUS FLOW", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                "  {}/{} done ({}%)  Streak {}d  ",
                progress.completed,
                progress.total,
                progress.percent,
                self.store.stats().streak_days
            )),
            Span::styled(
                format!("{}: {}h planned", workload.headline(), workload.hours()),
                Style::default().fg(workload_color).add_modifier(Modifier::ITALIC),
            ),
            Span::styled(filter, Style::default().fg(Color::Cyan)),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, i);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize) {
        let is_selected = column_index == self.selected_column;
        let status = Status::ALL[column_index];
        let border_style = if is_selected {
            Style::default().fg(FOCUS_BLUE).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}) ", format_status(status), self.columns[column_index].len()))
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let cards = &self.columns[column_index];
        if cards.is_empty() {
            return;
        }

        let available_height = inner.height as usize;
        let visible_cards = (available_height / CARD_HEIGHT).max(1);

        let scroll_offset = if is_selected {
            let start_visible = self.column_scroll_offsets[column_index];
            if self.selected_card < start_visible {
                self.selected_card
            } else if self.selected_card >= start_visible + visible_cards {
                self.selected_card + 1 - visible_cards
            } else {
                start_visible
            }
        } else {
            self.column_scroll_offsets[column_index].min(cards.len() - 1)
        };
        self.column_scroll_offsets[column_index] = scroll_offset;

        let mut current_y = 0;
        for (card_index, task_id) in self.columns[column_index].iter().enumerate().skip(scroll_offset) {
            if current_y + CARD_HEIGHT > available_height {
                break;
            }
            let Some(task) = self.store.get(task_id) else {
                continue;
            };
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: CARD_HEIGHT as u16,
            };
            let is_bound = self.session.active_task_id() == Some(task.id.as_str());
            render_card(f, card_area, task, is_selected && card_index == self.selected_card, is_bound);
            current_y += CARD_HEIGHT;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{scroll_offset} above")).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }
    }

    fn render_minimised_timer(&self, f: &mut Frame, area: Rect) {
        let title = self
            .session
            .active_task_id()
            .and_then(|id| self.store.get(id))
            .map(|t| t.title.as_str())
            .unwrap_or("-");
        let label = focus_state_label(self.session.state(&self.store));
        let text = format!(
            " ⏱ {}  {}  {}  (f: open)",
            format_countdown(self.session.remaining_seconds()),
            label,
            truncate(title, 40)
        );
        let bar = Paragraph::new(text).style(Style::default().bg(FOCUS_BLUE).fg(Color::White));
        f.render_widget(bar, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(input) = &self.add_input {
            format!("New: {}█", input.value)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let total: usize = self.columns.iter().map(Vec::len).sum();
            format!("Tasks: {total} | a: Add | c: Complete | f: Focus | /: Category | h: Help | q: Quit")
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(SLATE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task_id().and_then(|id| self.store.get(&id)) else {
            return;
        };
        let popup_area = centered_rect(60, 50, f.area());
        f.render_widget(Clear, popup_area);

        let created = task.created_at.with_timezone(&Local).format("%a %d %b %Y %H:%M");
        let detail_lines = vec![
            Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(format!("Id:        {}", task.id)),
            Line::from(format!("Status:    {}", format_status(task.status))),
            Line::from(format!("Priority:  {}", format_priority(task.priority))),
            Line::from(format!("Estimate:  {}", format_minutes(task.estimated_time))),
            Line::from(format!("Category:  {}", format_category(task.category))),
            Line::from(format!("Created:   {created}")),
        ];

        let popup = Paragraph::new(detail_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details (Enter to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(FOCUS_BLUE)),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_focus_overlay(&self, f: &mut Frame) {
        let Some(task) = self.session.active_task_id().and_then(|id| self.store.get(id)) else {
            return;
        };
        let area = f.area();
        f.render_widget(Clear, area);

        let state = self.session.state(&self.store);
        let controls = if self.session.is_running() {
            "space: Pause | c: Mark complete | Esc: Minimise"
        } else {
            "space: Start | c: Mark complete | Esc: Minimise"
        };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("NOW FOCUSING ON", Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(Span::styled(
                format_countdown(self.session.remaining_seconds()),
                Style::default().fg(FOCUS_BLUE).add_modifier(Modifier::BOLD),
            )),
            Line::from(focus_state_label(state)),
            Line::from(""),
            Line::from(controls),
        ];
        let overlay = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(FOCUS_BLUE)));
        f.render_widget(overlay, centered_rect(70, 60, area));
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            let now = Instant::now();
            self.session.advance(now);
            self.session.reconcile(&self.store);
            terminal.draw(|f| self.render(f))?;

            let wait = self
                .session
                .next_tick_in(now)
                .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL));
            if event::poll(wait)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key, Instant::now()) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

fn render_card(f: &mut Frame, area: Rect, task: &Task, is_selected: bool, is_bound: bool) {
    let style = if is_selected {
        Style::default().bg(FOCUS_BLUE).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let available_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    let mut current_line = String::new();
    for word in task.title.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= available_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            if lines.len() >= 2 {
                break;
            }
        }
    }
    if !current_line.is_empty() && lines.len() < 2 {
        lines.push(current_line);
    }

    let mut card_text: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let mut meta = vec![
        Span::styled(format_priority(task.priority), Style::default().fg(priority_color(task.priority))),
        Span::raw(format!(" | {} | ", format_minutes(task.estimated_time))),
        Span::styled(format_category(task.category), Style::default().fg(category_color(task.category))),
    ];
    if is_bound {
        meta.push(Span::raw(" ⏱"));
    }
    card_text.push(Line::from(meta));

    let card = Paragraph::new(card_text)
        .block(Block::default().borders(Borders::ALL).title(short_id(&task.id).to_string()))
        .style(style);
    f.render_widget(card, area);
}

fn focus_state_label(state: FocusState) -> &'static str {
    match state {
        FocusState::Idle => "",
        FocusState::Paused => "Paused",
        FocusState::Running => "Running",
        FocusState::Expired => "Time's up",
    }
}

/// A rectangle of the given percentage size centred in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
