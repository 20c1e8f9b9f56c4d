//! In-memory backend used by tests.

use super::gateway::Gateway;
use super::types::{Assignment, Course, CourseInput, DashboardStats, Goal};
use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex};

/// The course the backend stores for a write
fn stored(input: &CourseInput, id: i64, user_id: i64) -> Course {
  Course {
    id,
    name: input.name.clone(),
    code: input.code.clone(),
    professor: input.professor.clone(),
    credits: input.credits,
    semester: input.semester.clone(),
    current_grade: input.current_grade.clone(),
    color: input.color.clone(),
    user_id: Some(user_id),
  }
}

/// A write request as the backend received it
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
  Create { user_id: i64, input: CourseInput },
  Update { user_id: i64, id: i64, input: CourseInput },
  Delete { id: i64 },
}

#[derive(Default)]
struct State {
  courses: Vec<Course>,
  next_id: i64,
  stats: DashboardStats,
  assignments: Vec<Assignment>,
  goals: Vec<Goal>,
  requests: Vec<Recorded>,
  list_calls: usize,
  fail_writes: bool,
}

/// Backend keeping everything in a `Vec`, with request recording.
#[derive(Clone, Default)]
pub struct MemoryGateway {
  state: Arc<Mutex<State>>,
}

impl MemoryGateway {
  pub fn new() -> Self {
    let gateway = Self::default();
    gateway.state.lock().unwrap().next_id = 1;
    gateway
  }

  pub fn with_courses(self, courses: Vec<Course>) -> Self {
    {
      let mut state = self.state.lock().unwrap();
      state.next_id = courses.iter().map(|c| c.id).max().unwrap_or(0) + 1;
      state.courses = courses;
    }
    self
  }

  pub fn with_dashboard(
    self,
    stats: DashboardStats,
    assignments: Vec<Assignment>,
    goals: Vec<Goal>,
  ) -> Self {
    {
      let mut state = self.state.lock().unwrap();
      state.stats = stats;
      state.assignments = assignments;
      state.goals = goals;
    }
    self
  }

  /// Make every write fail with a server error
  pub fn fail_writes(&self, fail: bool) {
    self.state.lock().unwrap().fail_writes = fail;
  }

  pub fn requests(&self) -> Vec<Recorded> {
    self.state.lock().unwrap().requests.clone()
  }

  pub fn list_calls(&self) -> usize {
    self.state.lock().unwrap().list_calls
  }

  pub fn courses(&self) -> Vec<Course> {
    self.state.lock().unwrap().courses.clone()
  }
}

impl Gateway for MemoryGateway {
  fn list_courses(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Course>>> {
    async move {
      let mut state = self.state.lock().unwrap();
      state.list_calls += 1;
      Ok(
        state
          .courses
          .iter()
          .filter(|c| c.user_id == Some(user_id))
          .cloned()
          .collect(),
      )
    }
    .boxed()
  }

  fn create_course<'a>(
    &'a self,
    user_id: i64,
    input: &'a CourseInput,
  ) -> BoxFuture<'a, Result<Course>> {
    async move {
      let mut state = self.state.lock().unwrap();
      state.requests.push(Recorded::Create {
        user_id,
        input: input.clone(),
      });
      if state.fail_writes {
        return Err(eyre!("Failed to create course: HTTP 500 Internal Server Error"));
      }
      let id = state.next_id;
      state.next_id += 1;
      let course = stored(input, id, user_id);
      state.courses.push(course.clone());
      Ok(course)
    }
    .boxed()
  }

  fn update_course<'a>(
    &'a self,
    user_id: i64,
    id: i64,
    input: &'a CourseInput,
  ) -> BoxFuture<'a, Result<Course>> {
    async move {
      let mut state = self.state.lock().unwrap();
      state.requests.push(Recorded::Update {
        user_id,
        id,
        input: input.clone(),
      });
      if state.fail_writes {
        return Err(eyre!("Failed to update course: HTTP 500 Internal Server Error"));
      }
      let course = stored(input, id, user_id);
      let slot = state
        .courses
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| eyre!("Failed to update course: HTTP 404 Not Found"))?;
      *slot = course.clone();
      Ok(course)
    }
    .boxed()
  }

  fn delete_course(&self, id: i64) -> BoxFuture<'_, Result<()>> {
    async move {
      let mut state = self.state.lock().unwrap();
      state.requests.push(Recorded::Delete { id });
      if state.fail_writes {
        return Err(eyre!("Failed to delete course: HTTP 500 Internal Server Error"));
      }
      state.courses.retain(|c| c.id != id);
      Ok(())
    }
    .boxed()
  }

  fn dashboard_stats(&self, _user_id: i64) -> BoxFuture<'_, Result<DashboardStats>> {
    async move { Ok(self.state.lock().unwrap().stats.clone()) }.boxed()
  }

  fn upcoming_assignments(&self, _user_id: i64) -> BoxFuture<'_, Result<Vec<Assignment>>> {
    async move { Ok(self.state.lock().unwrap().assignments.clone()) }.boxed()
  }

  fn list_goals(&self, _user_id: i64) -> BoxFuture<'_, Result<Vec<Goal>>> {
    async move { Ok(self.state.lock().unwrap().goals.clone()) }.boxed()
  }
}
