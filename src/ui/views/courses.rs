use crate::api::types::{Course, CourseWrite};
use crate::app::AppContext;
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::ui::components::{ConfirmEvent, ConfirmPrompt, CourseForm, FormEvent, KeyResult};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{course_color, grade_badge, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Flex;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::warn;

/// Course list with add, edit and delete
pub struct CoursesView {
  query: Query<Vec<Course>>,
  list_state: ListState,
  form: CourseForm,
  confirm: ConfirmPrompt<Course>,
  save: Mutation<CourseWrite, Course>,
  delete: Mutation<i64, ()>,
  status: Option<String>,
}

impl CoursesView {
  pub fn new(ctx: AppContext) -> Self {
    let mut query = ctx.courses_query();
    query.fetch();

    Self {
      query,
      list_state: ListState::default(),
      form: CourseForm::new(ctx.config.courses.default_color.clone()),
      confirm: ConfirmPrompt::new(),
      save: ctx.save_course_mutation(),
      delete: ctx.delete_course_mutation(),
      status: None,
    }
  }

  fn courses(&self) -> &[Course] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_course(&self) -> Option<&Course> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.courses().get(idx))
  }

  fn submit(&mut self, write: CourseWrite) {
    if self.save.mutate(write) {
      self.form.set_submitting(true);
    } else {
      self.form.set_error("A save is already in progress");
    }
  }

  fn poll_mutations(&mut self) {
    if self.save.poll() {
      match self.save.state() {
        MutationState::Success(course) => {
          self.status = Some(format!("Saved {}", course.name));
          if self.form.is_submitting() {
            self.form.close();
          }
        }
        MutationState::Error(e) => {
          warn!(error = %e, "course save failed");
          if self.form.is_submitting() {
            self.form.set_error(e.clone());
          } else {
            self.status = Some(e.clone());
          }
        }
        _ => {}
      }
    }

    if self.delete.poll() {
      self.status = match self.delete.state() {
        MutationState::Success(()) => Some("Course deleted".to_string()),
        MutationState::Error(e) => Some(e.clone()),
        _ => None,
      };
    }
  }

  fn render_empty(&self, frame: &mut Frame, area: Rect, block: Block) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
      Line::styled("No courses yet", Style::default().fg(Color::White).bold()),
      Line::styled(
        "Add your first course to get started",
        Style::default().fg(Color::Gray),
      ),
      Line::raw(""),
      Line::from(vec![
        Span::styled("<a>", Style::default().fg(Color::Cyan)),
        Span::styled(" Add Course", Style::default().fg(Color::Green).bold()),
      ]),
    ];
    let [middle] = Layout::vertical([Constraint::Length(lines.len() as u16)])
      .flex(Flex::Center)
      .areas(inner);
    frame.render_widget(
      Paragraph::new(lines).alignment(Alignment::Center),
      middle,
    );
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.courses().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading { .. } => " Courses (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Courses (error: {}) ", e),
      _ => format!(" Courses ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      if self.query.is_success() {
        self.render_empty(frame, area, block);
        return;
      }
      let content = if self.query.is_error() {
        "Failed to load courses. Press 'r' to retry."
      } else {
        "Loading courses..."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .courses()
      .iter()
      .map(|course| {
        let credits = course
          .credits
          .map(|c| format!("{} cr", c))
          .unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::styled("● ", Style::default().fg(course_color(&course.color))),
          Span::styled(
            format!("{:<30}", truncate(&course.name, 30)),
            Style::default().fg(Color::White),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<10}", truncate(&course.code, 10)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!(
              "{:<18}",
              truncate(course.professor.as_deref().unwrap_or(""), 18)
            ),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(format!("{:>6} ", credits), Style::default().fg(Color::Gray)),
          grade_badge(course),
          Span::styled(
            format!(" {}", course.semester.as_deref().unwrap_or("")),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for CoursesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Open form gets every key first
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submit(write)) => {
        self.submit(write);
        return ViewAction::None;
      }
      KeyResult::Event(FormEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed(course)) => {
        if self.delete.mutate(course.id) {
          self.status = Some(format!("Deleting {}...", course.name));
        }
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('a') => {
        self.status = None;
        self.form.open_create();
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(course) = self.selected_course().cloned() {
          self.status = None;
          self.form.open_edit(&course);
        }
      }
      KeyCode::Char('d') => {
        if self.delete.is_pending() {
          self.status = Some("A delete is already in progress".to_string());
        } else if let Some(course) = self.selected_course().cloned() {
          self.confirm.ask(
            format!("Delete {} ({})?", course.name, course.code),
            course,
          );
        }
      }
      KeyCode::Char('r') => {
        self.query.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.form.editing() {
      Some(_) if self.form.is_open() => "Courses > Edit".to_string(),
      None if self.form.is_open() => "Courses > New".to_string(),
      _ => "Courses".to_string(),
    }
  }

  fn tick(&mut self) {
    if self.query.poll() {
      let len = self.courses().len();
      ensure_valid_selection(&mut self.list_state, len);
    }
    self.poll_mutations();
  }

  fn captures_input(&self) -> bool {
    self.form.is_open() || self.confirm.is_active()
  }

  fn status(&self) -> Option<String> {
    self.status.clone()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::memory::{MemoryGateway, Recorded};
  use crate::api::types::{CourseInput, DEFAULT_COURSE_COLOR};
  use crate::config::Config;
  use crate::ui::buffer_text;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn type_str(view: &mut CoursesView, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn course(id: i64, name: &str, code: &str) -> Course {
    Course {
      id,
      name: name.to_string(),
      code: code.to_string(),
      professor: Some("Dr. Smith".to_string()),
      credits: Some(3),
      semester: Some("Spring 2024".to_string()),
      current_grade: Some("85.5".to_string()),
      color: DEFAULT_COURSE_COLOR.to_string(),
      user_id: Some(1),
    }
  }

  async fn settle(view: &mut CoursesView) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
  }

  async fn loaded_view(gateway: &MemoryGateway) -> CoursesView {
    let ctx = AppContext::new(Config::default(), Arc::new(gateway.clone()));
    let mut view = CoursesView::new(ctx);
    settle(&mut view).await;
    view
  }

  fn render(view: &mut CoursesView) -> String {
    let mut terminal = Terminal::new(TestBackend::new(110, 20)).unwrap();
    terminal.draw(|f| view.render(f, f.area())).unwrap();
    buffer_text(terminal.backend().buffer())
  }

  #[tokio::test]
  async fn test_empty_state() {
    let gateway = MemoryGateway::new();
    let mut view = loaded_view(&gateway).await;

    let text = render(&mut view);
    assert!(text.contains("No courses yet"));
    assert!(text.contains("Add Course"));
    assert!(!text.contains("●"));
  }

  #[tokio::test]
  async fn test_lists_courses() {
    let gateway = MemoryGateway::new().with_courses(vec![
      course(1, "Anatomy & Physiology II", "NURS 202"),
      course(2, "Pharmacology", "NURS 305"),
    ]);
    let mut view = loaded_view(&gateway).await;

    let text = render(&mut view);
    assert!(text.contains("Courses (2)"));
    assert!(text.contains("NURS 202"));
    assert!(text.contains("Pharmacology"));
    assert!(text.contains("85.5%"));
    assert!(!text.contains("No courses yet"));
  }

  #[tokio::test]
  async fn test_add_course_creates_and_closes_form() {
    let gateway = MemoryGateway::new();
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('a')));
    assert!(view.captures_input());
    type_str(&mut view, "Pharmacology");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 305");
    view.handle_key(key(KeyCode::Tab));
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "4");
    view.handle_key(ctrl('s'));
    assert!(view.form.is_submitting());

    settle(&mut view).await;

    assert!(!view.form.is_open());
    assert_eq!(view.form.editing(), None);
    assert_eq!(
      gateway.requests(),
      vec![Recorded::Create {
        user_id: 1,
        input: CourseInput {
          name: "Pharmacology".to_string(),
          code: "NURS 305".to_string(),
          credits: Some(4),
          color: DEFAULT_COURSE_COLOR.to_string(),
          ..Default::default()
        },
      }]
    );

    // The invalidated list refetched with exactly one new entry
    assert_eq!(view.courses().len(), 1);
    assert_eq!(view.courses()[0].name, "Pharmacology");
    assert_eq!(view.status().as_deref(), Some("Saved Pharmacology"));
  }

  #[tokio::test]
  async fn test_edit_keeps_id() {
    let gateway = MemoryGateway::new().with_courses(vec![course(9, "Pharmacology", "NURS 305")]);
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('e')));
    assert_eq!(view.breadcrumb_label(), "Courses > Edit");
    view.handle_key(ctrl('u'));
    type_str(&mut view, "Advanced Pharmacology");
    view.handle_key(ctrl('s'));

    settle(&mut view).await;

    assert!(!view.form.is_open());
    assert_eq!(view.courses().len(), 1);
    assert_eq!(view.courses()[0].id, 9);
    assert_eq!(view.courses()[0].name, "Advanced Pharmacology");
    assert!(matches!(
      gateway.requests().as_slice(),
      [Recorded::Update { id: 9, user_id: 1, .. }]
    ));
  }

  #[tokio::test]
  async fn test_failed_save_keeps_form_open() {
    let gateway = MemoryGateway::new();
    gateway.fail_writes(true);
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('a')));
    type_str(&mut view, "Pharmacology");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 305");
    view.handle_key(ctrl('s'));

    settle(&mut view).await;

    assert!(view.form.is_open());
    assert!(!view.form.is_submitting());
    assert_eq!(
      view.form.error(),
      Some("Failed to create course: HTTP 500 Internal Server Error")
    );
    assert!(view.courses().is_empty());
  }

  #[tokio::test]
  async fn test_escape_during_save_keeps_form_until_done() {
    let gateway = MemoryGateway::new();
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('a')));
    type_str(&mut view, "Pharmacology");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 305");
    view.handle_key(ctrl('s'));

    // Esc does not abandon the save in flight
    view.handle_key(key(KeyCode::Esc));
    assert!(view.form.is_open());
    assert!(view.form.is_submitting());

    settle(&mut view).await;
    assert!(!view.form.is_open());

    // A second form submits on its own and is closed by its own result
    view.handle_key(key(KeyCode::Char('a')));
    type_str(&mut view, "Microbiology");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 210");
    view.handle_key(ctrl('s'));
    assert!(view.form.is_submitting());

    settle(&mut view).await;

    assert!(!view.form.is_open());
    assert_eq!(gateway.requests().len(), 2);
    assert_eq!(view.courses().len(), 2);
    assert_eq!(view.status().as_deref(), Some("Saved Microbiology"));
  }

  #[tokio::test]
  async fn test_save_result_leaves_unrelated_form_alone() {
    let gateway = MemoryGateway::new();
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('a')));
    type_str(&mut view, "Pharmacology");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 305");
    view.handle_key(ctrl('s'));

    // The form is reopened before the first save reports back
    view.form.close();
    view.handle_key(key(KeyCode::Char('a')));
    type_str(&mut view, "Micro");
    view.handle_key(ctrl('s'));
    assert_eq!(view.form.error(), Some("Course Code is required"));
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "NURS 210");
    view.handle_key(ctrl('s'));
    assert_eq!(view.form.error(), Some("A save is already in progress"));

    settle(&mut view).await;

    assert!(view.form.is_open());
    assert_eq!(view.status().as_deref(), Some("Saved Pharmacology"));
    match view.form.submission() {
      Ok(CourseWrite::Create(input)) => assert_eq!(input.name, "Micro"),
      other => panic!("expected the second form intact, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_delete_requires_confirmation() {
    let gateway = MemoryGateway::new().with_courses(vec![
      course(1, "Anatomy & Physiology II", "NURS 202"),
      course(2, "Pharmacology", "NURS 305"),
    ]);
    let mut view = loaded_view(&gateway).await;

    view.handle_key(key(KeyCode::Char('j')));
    view.handle_key(key(KeyCode::Char('d')));
    assert!(view.captures_input());

    // Declining deletes nothing
    view.handle_key(key(KeyCode::Char('n')));
    assert!(gateway.requests().is_empty());

    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('y')));
    settle(&mut view).await;

    assert_eq!(gateway.requests(), vec![Recorded::Delete { id: 2 }]);
    assert!(view.courses().iter().all(|c| c.id != 2));
    assert_eq!(view.courses().len(), 1);
    assert_eq!(view.status().as_deref(), Some("Course deleted"));
  }

  #[tokio::test]
  async fn test_cached_list_served_without_refetch() {
    let gateway = MemoryGateway::new().with_courses(vec![course(1, "Pharmacology", "NURS 305")]);
    let ctx = AppContext::new(Config::default(), Arc::new(gateway.clone()));

    let mut first = CoursesView::new(ctx.clone());
    settle(&mut first).await;
    let second = CoursesView::new(ctx);

    assert_eq!(second.courses().len(), 1);
    assert_eq!(gateway.list_calls(), 1);
  }
}
