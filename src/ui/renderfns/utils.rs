use crate::api::types::{parse_hex_color, Course, GradeBucket, Priority};
use ratatui::prelude::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a grade bucket
pub fn grade_color(bucket: GradeBucket) -> Color {
  match bucket {
    GradeBucket::A => Color::Green,
    GradeBucket::B => Color::Blue,
    GradeBucket::C => Color::Yellow,
    GradeBucket::D => Color::Red,
  }
}

/// Get the display color for an assignment priority
pub fn priority_color(priority: Priority) -> Color {
  match priority {
    Priority::High => Color::Red,
    Priority::Medium => Color::Yellow,
    Priority::Low | Priority::Other => Color::Blue,
  }
}

/// Terminal colour for a course's hex colour, gray if it does not parse
pub fn course_color(hex: &str) -> Color {
  match parse_hex_color(hex) {
    Some((r, g, b)) => Color::Rgb(r, g, b),
    None => Color::Gray,
  }
}

/// Grade badge, e.g. " 92% " on green. Missing grades read " N/A " in the D colour.
pub fn grade_badge(course: &Course) -> Span<'static> {
  Span::styled(
    format!(" {} ", course.grade_label()),
    Style::default()
      .fg(Color::Black)
      .bg(grade_color(course.grade_bucket()))
      .bold(),
  )
}
