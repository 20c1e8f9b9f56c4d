//! The backend seam: every logical operation the client performs.

use color_eyre::Result;
use futures::future::BoxFuture;

use super::types::{Assignment, Course, CourseInput, DashboardStats, Goal};

/// Operations against the NurseStudy backend.
///
/// `ApiClient` implements this over HTTP. Views only ever see a
/// `SharedGateway`, so they can run against any backend.
pub trait Gateway: Send + Sync {
  /// GET /api/courses?userId={id}
  fn list_courses(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Course>>>;

  /// POST /api/courses
  fn create_course<'a>(
    &'a self,
    user_id: i64,
    input: &'a CourseInput,
  ) -> BoxFuture<'a, Result<Course>>;

  /// PUT /api/courses/{id}
  fn update_course<'a>(
    &'a self,
    user_id: i64,
    id: i64,
    input: &'a CourseInput,
  ) -> BoxFuture<'a, Result<Course>>;

  /// DELETE /api/courses/{id}
  fn delete_course(&self, id: i64) -> BoxFuture<'_, Result<()>>;

  /// GET /api/dashboard-stats/{id}
  fn dashboard_stats(&self, user_id: i64) -> BoxFuture<'_, Result<DashboardStats>>;

  /// GET /api/assignments?userId={id}&upcoming=true
  fn upcoming_assignments(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Assignment>>>;

  /// GET /api/goals?userId={id}
  fn list_goals(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Goal>>>;
}

pub type SharedGateway = std::sync::Arc<dyn Gateway>;
