use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use treekeeper_core::health::HealthStatus;
use treekeeper_core::maintenance::{MaintenanceKind, MaintenanceToggleSet};
use treekeeper_core::session::{FieldEditSession, SessionState};
use treekeeper_core::tree::{TreeRecord, UpdateTree};
use treekeeper_core::visit::{CreateVisit, TreeVisitRecord};
use treekeeper_service::{BlockingHttpService, ServiceError};

use crate::auth::AuthContext;
use crate::cache::TreeCache;
use crate::components::visit_log::VisitLog;

/// What the app is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Record view; slider and history navigation live here
    Detail,
    /// Multiline notes editor
    EditNotes,
    /// Maintenance visit form
    Maintenance { focus: MaintenanceFocus },
    /// The requested tree id has no record behind it
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceFocus {
    Toggles,
    Volunteer,
    Comment,
}

impl MaintenanceFocus {
    fn next(self) -> Self {
        match self {
            MaintenanceFocus::Toggles => MaintenanceFocus::Volunteer,
            MaintenanceFocus::Volunteer => MaintenanceFocus::Comment,
            MaintenanceFocus::Comment => MaintenanceFocus::Toggles,
        }
    }

    fn prev(self) -> Self {
        match self {
            MaintenanceFocus::Toggles => MaintenanceFocus::Comment,
            MaintenanceFocus::Volunteer => MaintenanceFocus::Toggles,
            MaintenanceFocus::Comment => MaintenanceFocus::Volunteer,
        }
    }
}

/// The maintenance form's canonical value: toggle state plus free text.
/// Presentation strings (button labels, the done-summary) are derived from
/// this, never from widget state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitDraft {
    pub toggles: MaintenanceToggleSet,
    pub volunteer: String,
    pub comment: String,
}

pub struct App {
    service: BlockingHttpService,
    auth: Box<dyn AuthContext>,
    cache: TreeCache,
    mode: Mode,
    status_message: Option<String>,
    health: FieldEditSession<u8>,
    notes: FieldEditSession<String>,
    maintenance: FieldEditSession<VisitDraft>,
    visit_log: VisitLog,
}

impl App {
    pub fn new(
        service: BlockingHttpService,
        auth: Box<dyn AuthContext>,
        tree_id: &str,
    ) -> Result<Self> {
        let mut cache = TreeCache::new(tree_id);
        let mode = match cache.tree(&service) {
            Ok(_) => Mode::Detail,
            Err(ServiceError::NotFound(_)) => Mode::NoData,
            Err(e) => return Err(e.into()),
        };

        let (scale, notes) = match cache.cached_tree() {
            Some(tree) => (
                tree.health_scale().unwrap_or(HealthStatus::SCALE_MAX),
                tree.notes.clone().unwrap_or_default(),
            ),
            None => (HealthStatus::SCALE_MAX, String::new()),
        };

        let draft = VisitDraft {
            volunteer: auth.current_user().unwrap_or("Volunteer").to_string(),
            ..Default::default()
        };

        let mut app = Self {
            service,
            auth,
            cache,
            mode,
            status_message: None,
            health: FieldEditSession::new(scale),
            notes: FieldEditSession::new(notes),
            maintenance: FieldEditSession::new(draft),
            visit_log: VisitLog::new(),
        };
        if matches!(app.mode, Mode::Detail) {
            app.reload_history();
        }
        Ok(app)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn current_tree(&self) -> Option<&TreeRecord> {
        self.cache.cached_tree()
    }

    pub fn current_history(&self) -> Option<&[TreeVisitRecord]> {
        self.cache.cached_history()
    }

    pub fn health_state(&self) -> SessionState {
        self.health.state()
    }

    pub fn notes_state(&self) -> SessionState {
        self.notes.state()
    }

    pub fn maintenance_state(&self) -> SessionState {
        self.maintenance.state()
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, Mode::EditNotes | Mode::Maintenance { .. })
    }

    /// Returns true if the event loop should use a poll timeout instead of
    /// blocking, so `tick` can expire save feedback.
    pub fn needs_polling(&self) -> bool {
        self.health.has_pending_feedback()
            || self.notes.has_pending_feedback()
            || self.maintenance.has_pending_feedback()
    }

    /// Expire transient save feedback. Called on timeout from the event loop.
    pub fn tick(&mut self) {
        self.health.tick();
        self.notes.tick();
        self.maintenance.tick();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        match self.mode.clone() {
            Mode::Detail => self.handle_detail(key),
            Mode::EditNotes => self.handle_edit_notes(key),
            Mode::Maintenance { focus } => self.handle_maintenance(key, focus),
            Mode::NoData => self.handle_no_data(key),
        }
    }

    fn handle_detail(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_slider(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_slider(1),
            KeyCode::Char('n') => {
                if self.ensure_authenticated() {
                    self.mode = Mode::EditNotes;
                }
            }
            KeyCode::Char('m') => {
                if self.ensure_authenticated() {
                    self.mode = Mode::Maintenance {
                        focus: MaintenanceFocus::Toggles,
                    };
                }
            }
            KeyCode::Char('r') => self.refresh_all(),
            _ => {
                let len = self.cache.cached_history().map_or(0, |h| h.len());
                self.visit_log.handle_key(key, len);
            }
        }
    }

    fn handle_no_data(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('r') {
            self.cache.invalidate_tree();
            self.cache.invalidate_history();
            match self.cache.tree(&self.service) {
                Ok(_) => {
                    self.mode = Mode::Detail;
                    self.reload_record();
                    self.reload_history();
                }
                Err(ServiceError::NotFound(_)) => {
                    self.status_message = Some("still no data for this tree".into());
                }
                Err(e) => self.status_message = Some(format!("Error: {e}")),
            }
        }
    }

    fn handle_edit_notes(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_notes();
            }
            KeyCode::Esc => {
                // Discard local edits; the record text is the baseline again.
                let saved = self
                    .cache
                    .cached_tree()
                    .and_then(|t| t.notes.clone())
                    .unwrap_or_default();
                self.notes.reload(saved);
                self.mode = Mode::Detail;
            }
            KeyCode::Enter => self.edit_notes_value(|v| v.push('\n')),
            KeyCode::Backspace => self.edit_notes_value(|v| {
                v.pop();
            }),
            KeyCode::Char(c) => self.edit_notes_value(|v| v.push(c)),
            _ => {}
        }
    }

    fn edit_notes_value(&mut self, f: impl FnOnce(&mut String)) {
        let mut value = self.notes.value().clone();
        f(&mut value);
        self.notes.set_value(value);
    }

    fn handle_maintenance(&mut self, key: KeyEvent, focus: MaintenanceFocus) {
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_maintenance();
                return;
            }
            KeyCode::Esc => {
                // The draft sticks around; reopening the form resumes it.
                self.mode = Mode::Detail;
                return;
            }
            KeyCode::Tab => {
                self.mode = Mode::Maintenance {
                    focus: focus.next(),
                };
                return;
            }
            KeyCode::BackTab => {
                self.mode = Mode::Maintenance {
                    focus: focus.prev(),
                };
                return;
            }
            _ => {}
        }

        match focus {
            MaintenanceFocus::Toggles => {
                if let KeyCode::Char(c) = key.code {
                    if let Some(idx) = c.to_digit(10) {
                        let idx = idx as usize;
                        if (1..=MaintenanceKind::ALL.len()).contains(&idx) {
                            let kind = MaintenanceKind::ALL[idx - 1];
                            self.update_draft(|draft| draft.toggles.toggle(kind));
                        }
                    }
                }
            }
            MaintenanceFocus::Volunteer => match key.code {
                KeyCode::Backspace => self.update_draft(|draft| {
                    draft.volunteer.pop();
                }),
                KeyCode::Char(c) => self.update_draft(|draft| draft.volunteer.push(c)),
                _ => {}
            },
            MaintenanceFocus::Comment => match key.code {
                KeyCode::Backspace => self.update_draft(|draft| {
                    draft.comment.pop();
                }),
                KeyCode::Enter => self.update_draft(|draft| draft.comment.push('\n')),
                KeyCode::Char(c) => self.update_draft(|draft| draft.comment.push(c)),
                _ => {}
            },
        }
    }

    fn update_draft(&mut self, f: impl FnOnce(&mut VisitDraft)) {
        let mut draft = self.maintenance.value().clone();
        f(&mut draft);
        self.maintenance.set_value(draft);
    }

    fn ensure_authenticated(&mut self) -> bool {
        if self.auth.is_authenticated() {
            true
        } else {
            self.status_message = Some(self.auth.trigger_login());
            false
        }
    }

    fn move_slider(&mut self, delta: i16) {
        if !self.ensure_authenticated() {
            return;
        }
        let current = i16::from(*self.health.value());
        let next = (current + delta).clamp(
            i16::from(HealthStatus::SCALE_MIN),
            i16::from(HealthStatus::SCALE_MAX),
        ) as u8;
        if next == *self.health.value() {
            return;
        }
        self.health.set_value(next);
        self.save_health();
    }

    /// The slider autosaves: a change submits immediately, but only when the
    /// newly derived label differs from the label on display. The payload
    /// always carries the label, never the raw scale value.
    fn save_health(&mut self) {
        let displayed = self.cache.cached_tree().and_then(|t| t.derived_health());
        let Some(new_label) = HealthStatus::from_scale(i64::from(*self.health.value())) else {
            return;
        };
        if Some(new_label) == displayed {
            return;
        }
        if self.health.begin_save().is_none() {
            return; // a save is already in flight
        }
        let update = UpdateTree::health(self.cache.tree_id(), new_label);
        let result = self
            .service
            .update_tree(&update)
            .map(|_| ())
            .map_err(|e| e.to_string());
        let succeeded = result.is_ok();
        self.health.resolve(result);
        if succeeded {
            self.cache.invalidate_tree();
            self.reload_record();
        }
    }

    fn submit_notes(&mut self) {
        // Empty notes are never sent; explicit submit only.
        if self.notes.value().is_empty() {
            return;
        }
        let Some(captured) = self.notes.begin_save() else {
            return;
        };
        let update = UpdateTree::notes(self.cache.tree_id(), &captured);
        let result = self
            .service
            .update_tree(&update)
            .map(|_| ())
            .map_err(|e| e.to_string());
        let succeeded = result.is_ok();
        self.notes.resolve(result);
        if succeeded {
            self.cache.invalidate_tree();
            self.reload_record();
        }
    }

    fn submit_maintenance(&mut self) {
        let draft = self.maintenance.value().clone();
        let visit = CreateVisit::now(self.cache.tree_id())
            .with_toggles(&draft.toggles)
            .with_comment(&draft.comment)
            .with_volunteer(&draft.volunteer);
        // Nothing worth recording: skip the write entirely. Not an error.
        if !visit.has_maintenance_fields() {
            return;
        }
        if self.maintenance.begin_save().is_none() {
            return;
        }
        let result = self
            .service
            .append_visit(&visit)
            .map(|_| ())
            .map_err(|e| e.to_string());
        let succeeded = result.is_ok();
        self.maintenance.resolve(result);
        if succeeded {
            self.cache.invalidate_history();
            self.reload_history();
        }
    }

    fn refresh_all(&mut self) {
        self.cache.invalidate_tree();
        self.cache.invalidate_history();
        self.reload_record();
        self.reload_history();
    }

    /// Refetch the record after an invalidation and re-seed sessions that
    /// have no local edits or feedback in progress.
    fn reload_record(&mut self) {
        let (scale, notes) = match self.cache.tree(&self.service) {
            Ok(tree) => (
                tree.health_scale(),
                tree.notes.clone().unwrap_or_default(),
            ),
            Err(ServiceError::NotFound(_)) => {
                self.mode = Mode::NoData;
                return;
            }
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };

        if matches!(self.notes.state(), SessionState::Idle) {
            self.notes.reload(notes);
        }
        if let Some(scale) = scale {
            if matches!(self.health.state(), SessionState::Idle) {
                self.health.reload(scale);
            }
        }
    }

    fn reload_history(&mut self) {
        if let Err(e) = self.cache.history(&self.service) {
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let Some(tree) = self.cache.cached_tree() else {
            self.render_no_data(frame, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, tree, chunks[0]);
        self.render_health(frame, tree, chunks[1]);
        self.render_notes(frame, tree, chunks[2]);
        let history = self.cache.cached_history().unwrap_or(&[]);
        self.visit_log.render(frame, chunks[3], history);
        self.render_status_bar(frame, chunks[4]);

        match self.mode {
            Mode::EditNotes => self.render_notes_editor(frame, area),
            Mode::Maintenance { focus } => self.render_maintenance_form(frame, focus, area),
            _ => {}
        }
    }

    fn render_no_data(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 30, area);
        let block = Block::default()
            .title(" Tree ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let text = format!(
            "no data for tree {}\n\n(r) retry   (q) quit",
            self.cache.tree_id()
        );
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup);
    }

    fn render_header(&self, frame: &mut Frame, tree: &TreeRecord, area: Rect) {
        let mut lines = Vec::new();
        if let Some(ref common) = tree.common {
            lines.push(Line::from(Span::styled(
                common.clone(),
                Style::default().bold(),
            )));
        }
        if let Some(ref scientific) = tree.scientific {
            lines.push(Line::from(Span::styled(
                scientific.clone(),
                Style::default().italic().fg(Color::DarkGray),
            )));
        }
        if let Some(ref planted) = tree.date_planted {
            lines.push(Line::from(format!("Planted: {planted}")));
        }
        let block = Block::default().borders(Borders::BOTTOM);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_health(&self, frame: &mut Frame, _tree: &TreeRecord, area: Rect) {
        let block = Block::default()
            .title(" Overall Health ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let current = *self.health.value();
        let mut cells: Vec<Span> = Vec::new();
        for status in HealthStatus::ALL {
            let marker = if status.scale() == current { "●" } else { "─" };
            let style = if status.scale() == current {
                Style::default().fg(Color::Green).bold()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            cells.push(Span::styled(format!("{marker} "), style));
        }

        let label = HealthStatus::from_scale(i64::from(current))
            .map(|h| h.as_str())
            .unwrap_or("unknown");
        let mut label_spans = vec![Span::styled(label, Style::default().bold())];
        if let Some(feedback) = feedback_span(self.health.state()) {
            label_spans.push(Span::raw("  "));
            label_spans.push(feedback);
        }

        let lines = vec![Line::from(cells), Line::from(label_spans)];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_notes(&self, frame: &mut Frame, tree: &TreeRecord, area: Rect) {
        let block = Block::default()
            .title(" Tree Notes (n to edit) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let text = tree.notes.as_deref().unwrap_or("(none)");
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            frame.render_widget(
                Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red))),
                area,
            );
            return;
        }

        let hints: Vec<(&str, &str)> = match self.mode {
            Mode::Detail => vec![
                ("←/→", "health"),
                ("n", "notes"),
                ("m", "maintenance"),
                ("j/k", "history"),
                ("r", "refresh"),
                ("q", "quit"),
            ],
            Mode::EditNotes => vec![("Ctrl+S", "save"), ("Esc", "back")],
            Mode::Maintenance { .. } => vec![
                ("1-6", "toggle"),
                ("Tab", "field"),
                ("Ctrl+S", "save"),
                ("Esc", "back"),
            ],
            Mode::NoData => vec![("r", "retry"), ("q", "quit")],
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();
        frame.render_widget(Line::from(spans), area);
    }

    fn render_notes_editor(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Edit Notes (Ctrl+S save, Esc cancel) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(self.notes.value().as_str()).wrap(Wrap { trim: false }),
            chunks[0],
        );
        if let Some(button) = save_button(self.notes.state()) {
            frame.render_widget(
                Paragraph::new(button).alignment(Alignment::Right),
                chunks[1],
            );
        }
    }

    fn render_maintenance_form(&self, frame: &mut Frame, focus: MaintenanceFocus, area: Rect) {
        let popup = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Tree Maintenance ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let draft = self.maintenance.value();

        let field_style = |active: bool| {
            if active {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default()
            }
        };

        let mut toggle_spans: Vec<Span> = Vec::new();
        for (i, &kind) in MaintenanceKind::ALL.iter().enumerate() {
            let label = draft.toggles.label(kind);
            let style = if draft.toggles.is_on(kind) {
                Style::default().fg(Color::Green).bold()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            toggle_spans.push(Span::styled(
                format!("[{}] {label}  ", i + 1),
                style,
            ));
        }

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    "Volunteer: ",
                    field_style(focus == MaintenanceFocus::Volunteer),
                ),
                Span::raw(draft.volunteer.clone()),
            ]),
            Line::from(""),
            Line::from(toggle_spans),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "Comment: ",
                    field_style(focus == MaintenanceFocus::Comment),
                ),
                Span::raw(draft.comment.clone()),
            ]),
        ];

        if draft.toggles.has_any_selected() {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::raw("Maintenance Done: "),
                Span::styled(draft.toggles.summary(), Style::default().fg(Color::Green)),
            ]));
        }

        if let Some(button) = save_button(self.maintenance.state()) {
            lines.push(Line::from(""));
            lines.push(Line::from(button).alignment(Alignment::Right));
        }

        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }),
            inner,
        );
    }
}

/// Inline save-state indicator next to the health label.
fn feedback_span(state: SessionState) -> Option<Span<'static>> {
    match state {
        SessionState::Saving => Some(Span::styled("SAVING", Style::default().fg(Color::Yellow))),
        SessionState::Success => Some(Span::styled("SAVED", Style::default().fg(Color::Green))),
        SessionState::Error(msg) => Some(Span::styled(msg, Style::default().fg(Color::Red))),
        SessionState::Idle | SessionState::Dirty => None,
    }
}

/// Save-button label for the form popups. Hidden while the field is clean;
/// an error message becomes the label itself until it auto-clears.
fn save_button(state: SessionState) -> Option<Span<'static>> {
    match state {
        SessionState::Idle => None,
        SessionState::Dirty => Some(Span::styled(
            "[ SAVE ]",
            Style::default().fg(Color::White).bold(),
        )),
        SessionState::Saving => Some(Span::styled(
            "[ SAVING ]",
            Style::default().fg(Color::Yellow),
        )),
        SessionState::Success => Some(Span::styled(
            "[ SAVED ]",
            Style::default().fg(Color::Green).bold(),
        )),
        SessionState::Error(msg) => Some(Span::styled(
            format!("[ {msg} ]"),
            Style::default().fg(Color::Red).bold(),
        )),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
