use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Flex;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Placeholder for sections that are routed but not built yet
pub struct ComingSoonView {
  title: &'static str,
}

impl ComingSoonView {
  pub fn new(title: &'static str) -> Self {
    Self { title }
  }
}

impl View for ComingSoonView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = Line::styled(
      format!("{} - Coming Soon", self.title),
      Style::default().fg(Color::White).bold(),
    );
    let [row] = Layout::vertical([Constraint::Length(1)])
      .flex(Flex::Center)
      .areas(inner);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), row);
  }

  fn breadcrumb_label(&self) -> String {
    self.title.to_string()
  }
}
