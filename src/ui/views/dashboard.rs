use crate::api::types::{format_number, Assignment, Course, DashboardStats, Goal};
use crate::app::AppContext;
use crate::query::Query;
use crate::ui::renderfns::{course_color, grade_badge, priority_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::CoursesView;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

/// Study overview: stat cards, upcoming assignments, active goals and the
/// current course list
pub struct DashboardView {
  ctx: AppContext,
  stats: Query<DashboardStats>,
  assignments: Query<Vec<Assignment>>,
  goals: Query<Vec<Goal>>,
  courses: Query<Vec<Course>>,
}

impl DashboardView {
  pub fn new(ctx: AppContext) -> Self {
    let mut view = Self {
      stats: ctx.stats_query(),
      assignments: ctx.assignments_query(),
      goals: ctx.goals_query(),
      courses: ctx.courses_query(),
      ctx,
    };
    view.stats.fetch();
    view.assignments.fetch();
    view.goals.fetch();
    view.courses.fetch();
    view
  }

  fn upcoming(&self) -> &[Assignment] {
    let all = self.assignments.data().map(|v| v.as_slice()).unwrap_or(&[]);
    &all[..all.len().min(self.ctx.config.dashboard.assignment_limit)]
  }

  fn active_goals(&self) -> Vec<&Goal> {
    self
      .goals
      .data()
      .map(|goals| {
        goals
          .iter()
          .filter(|g| g.is_active())
          .take(self.ctx.config.dashboard.goal_limit)
          .collect()
      })
      .unwrap_or_default()
  }

  fn render_greeting(&self, frame: &mut Frame, area: Rect) {
    let profile = &self.ctx.config.profile;
    let mut lines = vec![Line::from(vec![
      Span::styled(
        format!(" Welcome back, {}! ", profile.name),
        Style::default().fg(Color::White).bold(),
      ),
      Span::styled(
        "Here's your nursing school overview.",
        Style::default().fg(Color::Gray),
      ),
    ])];

    lines.push(match self.stats.error() {
      Some(e) => Line::styled(
        format!(" {}. Press 'r' to retry.", e),
        Style::default().fg(Color::Red),
      ),
      None => Line::styled(
        format!(" {}", profile.program),
        Style::default().fg(Color::DarkGray),
      ),
    });

    frame.render_widget(Paragraph::new(lines), area);
  }

  fn render_stat_cards(&self, frame: &mut Frame, area: Rect) {
    let stats = self.stats.data();
    let value = |f: fn(&DashboardStats) -> f64| {
      stats
        .map(|s| format_number(f(s)))
        .unwrap_or_else(|| "-".to_string())
    };

    let cards = [
      ("Weekly Study Hours", value(|s| s.weekly_hours), Color::Green),
      ("Pending Assignments", value(|s| s.assignments), Color::Blue),
      ("Clinical Hours", value(|s| s.clinical_hours), Color::Cyan),
      (
        "Average Grade",
        format!("{}%", value(|s| s.average_grade)),
        Color::Yellow,
      ),
    ];

    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((label, value, color), column) in cards.into_iter().zip(columns.iter()) {
      let block = Block::default()
        .title(format!(" {} ", label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
      let paragraph = Paragraph::new(Line::styled(
        value,
        Style::default().fg(Color::White).bold(),
      ))
      .alignment(Alignment::Center)
      .block(block);
      frame.render_widget(paragraph, *column);
    }
  }

  fn render_assignments(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Upcoming Assignments ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let upcoming = self.upcoming();
    if upcoming.is_empty() {
      let content = if self.assignments.is_loading() {
        "Loading..."
      } else {
        "No upcoming assignments"
      };
      let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let title_width = (area.width as usize).saturating_sub(28).max(10);
    let items: Vec<ListItem> = upcoming
      .iter()
      .map(|assignment| {
        let due = assignment.due_date.with_timezone(&Local).format("%b %-d, %Y");
        ListItem::new(Line::from(vec![
          Span::raw(format!(
            "{:<width$}",
            truncate(&assignment.title, title_width),
            width = title_width
          )),
          Span::styled(format!(" Due: {:<13}", due), Style::default().fg(Color::Gray)),
          Span::styled(
            format!("{:>6}", assignment.priority.label()),
            Style::default().fg(priority_color(assignment.priority)),
          ),
        ]))
      })
      .collect();

    frame.render_widget(List::new(items).block(block), area);
  }

  fn render_goals(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Active Goals ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let goals = self.active_goals();
    if goals.is_empty() {
      let content = if self.goals.is_loading() {
        "Loading..."
      } else {
        "No active goals"
      };
      let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    // Two rows per goal: caption, then gauge
    let rows = Layout::vertical(goals.iter().map(|_| Constraint::Length(2))).split(inner);
    for (goal, row) in goals.iter().zip(rows.iter()) {
      let [caption, bar] = Layout::vertical([Constraint::Length(1); 2]).areas(*row);

      let progress = format!(
        "{}/{} {}",
        format_number(goal.current_value),
        format_number(goal.target_value),
        goal.unit
      );
      let title_width = (caption.width as usize).saturating_sub(progress.len() + 1);
      frame.render_widget(
        Paragraph::new(Line::from(vec![
          Span::styled(
            format!("{:<width$}", truncate(&goal.title, title_width), width = title_width),
            Style::default().fg(Color::White),
          ),
          Span::styled(format!(" {}", progress), Style::default().fg(Color::Gray)),
        ])),
        caption,
      );

      let percent = goal.progress_percent();
      let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .ratio(percent / 100.0)
        .label(format!("{:.0}%", percent));
      frame.render_widget(gauge, bar);
    }
  }

  fn render_courses(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Current Courses ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let courses = self.courses.data().map(|v| v.as_slice()).unwrap_or(&[]);
    if courses.is_empty() {
      let content = match (self.courses.is_loading(), self.courses.error()) {
        (true, _) => "Loading...".to_string(),
        (false, Some(e)) => e.to_string(),
        (false, None) => "No courses yet. Press 'c' to manage courses.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = courses
      .iter()
      .map(|course| {
        ListItem::new(Line::from(vec![
          Span::styled(" ● ", Style::default().fg(course_color(&course.color))),
          Span::styled(
            format!("{:<32}", truncate(&course.name, 32)),
            Style::default().fg(Color::White).bold(),
          ),
          Span::styled(
            format!("{:<12}", truncate(&course.code, 12)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!(
              "{:<20}",
              truncate(course.professor.as_deref().unwrap_or(""), 20)
            ),
            Style::default().fg(Color::Gray),
          ),
          grade_badge(course),
        ]))
      })
      .collect();

    frame.render_widget(List::new(items).block(block), area);
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.stats.refetch();
        self.assignments.refetch();
        self.goals.refetch();
        self.courses.refetch();
      }
      KeyCode::Char('c') => {
        return ViewAction::Push(Box::new(CoursesView::new(self.ctx.clone())));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Dashboard ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Nothing to show until the stats arrive the first time
    if self.stats.is_loading() && self.stats.data().is_none() {
      let paragraph = Paragraph::new("Loading dashboard...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    let [greeting, cards, middle, courses] = Layout::vertical([
      Constraint::Length(2),
      Constraint::Length(3),
      Constraint::Min(8),
      Constraint::Min(5),
    ])
    .areas(inner);
    let [assignments, goals] = Layout::horizontal([Constraint::Ratio(1, 2); 2]).areas(middle);

    self.render_greeting(frame, greeting);
    self.render_stat_cards(frame, cards);
    self.render_assignments(frame, assignments);
    self.render_goals(frame, goals);
    self.render_courses(frame, courses);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) {
    self.stats.poll();
    self.assignments.poll();
    self.goals.poll();
    self.courses.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("c", "courses").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::memory::MemoryGateway;
  use crate::api::types::{GoalStatus, Priority, DEFAULT_COURSE_COLOR};
  use crate::config::Config;
  use crate::ui::buffer_text;
  use chrono::{TimeZone, Utc};
  use ratatui::backend::TestBackend;
  use std::sync::Arc;
  use std::time::Duration;

  fn assignment(id: i64, title: &str, priority: Priority) -> Assignment {
    Assignment {
      id,
      title: title.to_string(),
      due_date: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
      priority,
      course_id: None,
    }
  }

  fn goal(id: i64, title: &str, status: GoalStatus, current: f64, target: f64) -> Goal {
    Goal {
      id,
      title: title.to_string(),
      status,
      current_value: current,
      target_value: target,
      unit: "hours".to_string(),
    }
  }

  fn seeded_gateway() -> MemoryGateway {
    let stats = DashboardStats {
      weekly_hours: 24.0,
      assignments: 6.0,
      clinical_hours: 120.0,
      average_grade: 87.5,
    };
    let assignments = (1..=7)
      .map(|i| assignment(i, &format!("Care plan {}", i), Priority::High))
      .collect();
    let goals = vec![
      goal(1, "Clinical rotation", GoalStatus::Active, 30.0, 40.0),
      goal(2, "Finished goal", GoalStatus::Completed, 10.0, 10.0),
      goal(3, "Pharm flashcards", GoalStatus::Active, 50.0, 40.0),
    ];
    let course = Course {
      id: 1,
      name: "Pharmacology".to_string(),
      code: "NURS 305".to_string(),
      professor: Some("Dr. Smith".to_string()),
      credits: Some(4),
      semester: None,
      current_grade: Some("92".to_string()),
      color: DEFAULT_COURSE_COLOR.to_string(),
      user_id: Some(1),
    };
    MemoryGateway::new()
      .with_courses(vec![course])
      .with_dashboard(stats, assignments, goals)
  }

  async fn loaded_view(gateway: MemoryGateway) -> DashboardView {
    let ctx = AppContext::new(Config::default(), Arc::new(gateway));
    let mut view = DashboardView::new(ctx);
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
    view
  }

  fn render(view: &mut DashboardView) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
    terminal.draw(|f| view.render(f, f.area())).unwrap();
    buffer_text(terminal.backend().buffer())
  }

  #[tokio::test]
  async fn test_loading_placeholder() {
    let ctx = AppContext::new(Config::default(), Arc::new(seeded_gateway()));
    let mut view = DashboardView::new(ctx);
    assert!(render(&mut view).contains("Loading dashboard..."));
  }

  #[tokio::test]
  async fn test_renders_sections() {
    let mut view = loaded_view(seeded_gateway()).await;
    let text = render(&mut view);

    assert!(text.contains("Welcome back, Sarah Johnson!"));
    assert!(text.contains("Weekly Study Hours"));
    assert!(text.contains("87.5%"));
    assert!(text.contains("120"));
    assert!(text.contains("Care plan 1"));
    assert!(text.contains("30/40 hours"));
    assert!(text.contains("75%"));
    assert!(text.contains("Pharmacology"));
    assert!(text.contains("92%"));
  }

  #[tokio::test]
  async fn test_limits_assignments_and_goals() {
    let view = loaded_view(seeded_gateway()).await;
    assert_eq!(view.upcoming().len(), 5);

    let goals = view.active_goals();
    assert_eq!(goals.len(), 2);
    assert!(goals.iter().all(|g| g.is_active()));
  }

  #[tokio::test]
  async fn test_empty_sections() {
    let mut view = loaded_view(MemoryGateway::new()).await;
    let text = render(&mut view);

    assert!(text.contains("No upcoming assignments"));
    assert!(text.contains("No active goals"));
    // Missing stats render as zero
    assert!(text.contains("0%"));
  }

  #[tokio::test]
  async fn test_c_opens_courses() {
    let mut view = loaded_view(MemoryGateway::new()).await;
    match view.handle_key(KeyEvent::new(KeyCode::Char('c'), crossterm::event::KeyModifiers::NONE)) {
      ViewAction::Push(next) => assert_eq!(next.breadcrumb_label(), "Courses"),
      _ => panic!("expected push"),
    }
  }
}
