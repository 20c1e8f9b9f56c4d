use crate::api::types::{Assignment, Course, CourseWrite, DashboardStats, Goal};
use crate::api::{course_write_invalidations, ApiClient, SharedGateway, StudyQuery};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::{Mutation, Query, QueryCache};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ComingSoonView, CoursesView, DashboardView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::future::Future;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared handles every view needs: the query cache, the backend, and the
/// active user. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
  pub cache: QueryCache,
  pub gateway: SharedGateway,
  pub user_id: i64,
  pub config: Arc<Config>,
}

impl AppContext {
  pub fn new(config: Config, gateway: SharedGateway) -> Self {
    let cache = QueryCache::new().with_stale_time(config.cache.stale_time());
    Self {
      cache,
      gateway,
      user_id: config.api.user_id,
      config: Arc::new(config),
    }
  }

  fn query<T, F, Fut>(&self, query: StudyQuery, fetch: F) -> Query<T>
  where
    T: Send + Sync + 'static,
    F: Fn(SharedGateway, i64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    debug!(key = %query.key(), "subscribing to {}", query.description());
    let gateway = self.gateway.clone();
    let user_id = self.user_id;
    Query::new(&self.cache, query.key(), move || {
      let pending = fetch(gateway.clone(), user_id);
      async move { pending.await.map_err(|e| e.to_string()) }
    })
  }

  pub fn courses_query(&self) -> Query<Vec<Course>> {
    let query = StudyQuery::Courses {
      user_id: self.user_id,
    };
    self.query(query, |gateway, user_id| async move {
      gateway.list_courses(user_id).await
    })
  }

  pub fn stats_query(&self) -> Query<DashboardStats> {
    let query = StudyQuery::DashboardStats {
      user_id: self.user_id,
    };
    self.query(query, |gateway, user_id| async move {
      gateway.dashboard_stats(user_id).await
    })
  }

  pub fn assignments_query(&self) -> Query<Vec<Assignment>> {
    let query = StudyQuery::UpcomingAssignments {
      user_id: self.user_id,
    };
    self.query(query, |gateway, user_id| async move {
      gateway.upcoming_assignments(user_id).await
    })
  }

  pub fn goals_query(&self) -> Query<Vec<Goal>> {
    let query = StudyQuery::Goals {
      user_id: self.user_id,
    };
    self.query(query, |gateway, user_id| async move {
      gateway.list_goals(user_id).await
    })
  }

  /// Create or update a course, refreshing course-derived queries on success
  pub fn save_course_mutation(&self) -> Mutation<CourseWrite, Course> {
    let gateway = self.gateway.clone();
    let user_id = self.user_id;
    let mutation = Mutation::new(&self.cache, move |write: CourseWrite| {
      let gateway = gateway.clone();
      async move {
        let saved = match &write {
          CourseWrite::Create(input) => {
            info!(code = %input.code, "creating course");
            gateway.create_course(user_id, input).await
          }
          CourseWrite::Update { id, input } => {
            info!(id, code = %input.code, "updating course");
            gateway.update_course(user_id, *id, input).await
          }
        };
        saved.map_err(|e| e.to_string())
      }
    });
    course_write_invalidations()
      .into_iter()
      .fold(mutation, |m, prefix| m.invalidates(prefix))
  }

  /// Delete a course by id, refreshing course-derived queries on success
  pub fn delete_course_mutation(&self) -> Mutation<i64, ()> {
    let gateway = self.gateway.clone();
    let mutation = Mutation::new(&self.cache, move |id: i64| {
      let gateway = gateway.clone();
      async move {
        info!(id, "deleting course");
        gateway.delete_course(id).await.map_err(|e| e.to_string())
      }
    });
    course_write_invalidations()
      .into_iter()
      .fold(mutation, |m, prefix| m.invalidates(prefix))
  }
}

/// Main application state
pub struct App {
  ctx: AppContext,

  /// Backend host shown in the header
  host: String,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command palette
  command: CommandInput,

  /// App-level message for the footer (e.g. unknown command)
  message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = ApiClient::new(&config)?;
    let host = client.host();
    info!(%host, user_id = config.api.user_id, "starting");
    Ok(Self::with_context(AppContext::new(config, Arc::new(client)), host))
  }

  pub fn with_context(ctx: AppContext, host: String) -> Self {
    let root: Box<dyn View> = Box::new(DashboardView::new(ctx.clone()));
    Self {
      ctx,
      host,
      view_stack: vec![root],
      command: CommandInput::new(),
      message: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));

    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Resize => {} // Next draw picks up the new size
    }
  }

  fn tick(&mut self) {
    // Views below the top keep polling so going back shows fresh data
    for view in &mut self.view_stack {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_captures = self
      .view_stack
      .last()
      .map(|v| v.captures_input())
      .unwrap_or(false);

    if self.command.is_active() || !view_captures {
      match self.command.handle_key(key) {
        KeyResult::Handled => {
          self.message = None;
          return;
        }
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    let root: Box<dyn View> = match cmd {
      "dashboard" => Box::new(DashboardView::new(self.ctx.clone())),
      "courses" => Box::new(CoursesView::new(self.ctx.clone())),
      "goals" => Box::new(ComingSoonView::new("Goals")),
      "planner" => Box::new(ComingSoonView::new("Planner")),
      "progress" => Box::new(ComingSoonView::new("Progress")),
      "settings" => Box::new(ComingSoonView::new("Settings")),
      "quit" => {
        self.should_quit = true;
        return;
      }
      "" => return,
      other => {
        self.message = Some(format!("Unknown command: {}", other));
        return;
      }
    };

    debug!(cmd, "switch root view");
    self.message = None;
    self.view_stack.clear();
    self.view_stack.push(root);
  }

  // Accessors for UI rendering
  pub fn title(&self) -> &str {
    self.ctx.config.title()
  }

  pub fn host(&self) -> &str {
    &self.host
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  /// Footer message: app-level first, then the current view's
  pub fn status(&self) -> Option<String> {
    self
      .message
      .clone()
      .or_else(|| self.view_stack.last().and_then(|v| v.status()))
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::memory::MemoryGateway;
  use crate::ui::buffer_text;
  use ratatui::backend::TestBackend;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn test_app() -> App {
    let ctx = AppContext::new(Config::default(), Arc::new(MemoryGateway::new()));
    App::with_context(ctx, "localhost:5000".to_string())
  }

  fn run_command(app: &mut App, cmd: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in cmd.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_starts_on_dashboard() {
    let app = test_app();
    assert_eq!(app.view_breadcrumb(), vec!["Dashboard"]);
  }

  #[tokio::test]
  async fn test_command_replaces_root() {
    let mut app = test_app();
    run_command(&mut app, "courses");
    assert_eq!(app.view_breadcrumb(), vec!["Courses"]);

    run_command(&mut app, "plan");
    assert_eq!(app.view_breadcrumb(), vec!["Planner"]);
  }

  #[tokio::test]
  async fn test_push_and_pop() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('c')));
    assert_eq!(app.view_breadcrumb(), vec!["Dashboard", "Courses"]);

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.view_breadcrumb(), vec!["Dashboard"]);
    assert!(!app.should_quit());

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_unknown_command_sets_message() {
    let mut app = test_app();
    run_command(&mut app, "zzz");
    assert_eq!(app.status().as_deref(), Some("Unknown command: zzz"));
    assert_eq!(app.view_breadcrumb(), vec!["Dashboard"]);
  }

  #[tokio::test]
  async fn test_quit_command() {
    let mut app = test_app();
    run_command(&mut app, "quit");
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_colon_goes_to_open_form() {
    let mut app = test_app();
    run_command(&mut app, "courses");
    app.handle_key(key(KeyCode::Char('a')));
    app.handle_key(key(KeyCode::Char(':')));

    // The form owns the keyboard, so the palette stays closed
    assert!(!app.command_input().is_active());
  }

  #[tokio::test]
  async fn test_draw_chrome() {
    let mut app = test_app();
    tokio::time::sleep(Duration::from_millis(10)).await;
    app.tick();

    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|f| ui::draw(f, &mut app)).unwrap();

    let text = buffer_text(terminal.backend().buffer());
    assert!(text.contains("NurseStudy Pro"));
    assert!(text.contains("localhost:5000"));
    assert!(text.contains("Dashboard"));
  }
}
