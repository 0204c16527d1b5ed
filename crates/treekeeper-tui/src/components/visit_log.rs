use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use treekeeper_core::visit::TreeVisitRecord;

/// Scrollable visit history list. Rows render in the order the gateway
/// returned them (newest first); this component never re-sorts.
pub struct VisitLog {
    list_state: ListState,
}

impl VisitLog {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, len: usize) {
        if len == 0 {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.list_state.selected().unwrap_or(0);
                if current + 1 < len {
                    self.list_state.select(Some(current + 1));
                } else {
                    self.list_state.select(Some(current));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some(current.saturating_sub(1)));
            }
            KeyCode::Char('g') => self.list_state.select(Some(0)),
            KeyCode::Char('G') => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, visits: &[TreeVisitRecord]) {
        let title = format!(" Tree Visit History ({}) ", visits.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        if visits.is_empty() {
            let empty = List::new(vec![ListItem::new("no visits recorded yet")]).block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = visits.iter().map(visit_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Green))
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Default for VisitLog {
    fn default() -> Self {
        Self::new()
    }
}

fn visit_item(visit: &TreeVisitRecord) -> ListItem<'_> {
    let date = visit.date_visit.format("%B %d %Y").to_string();
    let volunteer = visit.volunteer.as_deref().unwrap_or("volunteer");
    let mut lines = vec![Line::from(vec![
        Span::styled(date, Style::default().bold()),
        Span::raw(" tree visit by "),
        Span::raw(volunteer.to_string()),
    ])];

    if let Some(ref comment) = visit.comment {
        lines.push(Line::from(vec![
            Span::styled("  Comment: ", Style::default().fg(Color::DarkGray)),
            Span::raw(comment.clone()),
        ]));
    }

    let done = visit.maintenance_summary();
    if !done.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("  Maintenance Done: ", Style::default().fg(Color::DarkGray)),
            Span::styled(done, Style::default().fg(Color::Green)),
        ]));
    }

    ListItem::new(lines)
}
