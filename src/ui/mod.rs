pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function: header, current view, footer, then overlays
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, content, footer] = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Min(1),    // Main content
    Constraint::Length(1), // Breadcrumb
  ])
  .areas(frame.area());

  let breadcrumb = app.view_breadcrumb();
  let status = app.status();
  let title = app.title().to_string();
  let host = app.host().to_string();

  if let Some(view) = app.current_view_mut() {
    renderfns::draw_header(frame, header, &title, &host, &view.shortcuts());
    view.render(frame, content);
  }

  renderfns::draw_footer(frame, footer, &breadcrumb, status.as_deref());

  // Command palette draws over everything
  app.command_input().render_overlay(frame, content);
}

/// Keep a list selection inside `0..len`, selecting the first row when
/// there is data and nothing is selected
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Flatten a rendered buffer into text, one line per row
#[cfg(test)]
pub fn buffer_text(buffer: &Buffer) -> String {
  let area = buffer.area;
  let mut text = String::new();
  for y in area.top()..area.bottom() {
    for x in area.left()..area.right() {
      text.push_str(buffer[(x, y)].symbol());
    }
    text.push('\n');
  }
  text
}
