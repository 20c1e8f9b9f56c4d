//! Cache keys for backend queries.

use crate::query::QueryKey;

const COURSES: &str = "courses";
const DASHBOARD_STATS: &str = "dashboard-stats";
const ASSIGNMENTS: &str = "assignments";
const GOALS: &str = "goals";

/// Logical queries the client issues against the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudyQuery {
  /// Courses owned by a user
  Courses { user_id: i64 },
  /// Aggregate dashboard numbers
  DashboardStats { user_id: i64 },
  /// Assignments due soon
  UpcomingAssignments { user_id: i64 },
  /// Goals of a user
  Goals { user_id: i64 },
}

impl StudyQuery {
  pub fn key(&self) -> QueryKey {
    match self {
      Self::Courses { user_id } => QueryKey::new(COURSES).with(*user_id),
      Self::DashboardStats { user_id } => QueryKey::new(DASHBOARD_STATS).with(*user_id),
      Self::UpcomingAssignments { user_id } => {
        QueryKey::new(ASSIGNMENTS).with("upcoming").with(*user_id)
      }
      Self::Goals { user_id } => QueryKey::new(GOALS).with(*user_id),
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Courses { user_id } => format!("courses of user {}", user_id),
      Self::DashboardStats { user_id } => format!("dashboard stats of user {}", user_id),
      Self::UpcomingAssignments { user_id } => {
        format!("upcoming assignments of user {}", user_id)
      }
      Self::Goals { user_id } => format!("goals of user {}", user_id),
    }
  }
}

/// Prefixes invalidated after any course write.
///
/// The dashboard's average grade is derived from course grades, so it goes
/// stale together with the course list.
pub fn course_write_invalidations() -> Vec<QueryKey> {
  vec![QueryKey::new(COURSES), QueryKey::new(DASHBOARD_STATS)]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_course_writes_cover_course_and_stats_keys() {
    let prefixes = course_write_invalidations();
    let covered = |query: StudyQuery| prefixes.iter().any(|p| query.key().starts_with(p));

    assert!(covered(StudyQuery::Courses { user_id: 1 }));
    assert!(covered(StudyQuery::DashboardStats { user_id: 1 }));
    assert!(!covered(StudyQuery::Goals { user_id: 1 }));
    assert!(!covered(StudyQuery::UpcomingAssignments { user_id: 1 }));
  }

  #[test]
  fn test_keys_are_per_user() {
    assert_ne!(
      StudyQuery::Courses { user_id: 1 }.key(),
      StudyQuery::Courses { user_id: 2 }.key()
    );
  }

  #[test]
  fn test_description() {
    assert_eq!(
      StudyQuery::UpcomingAssignments { user_id: 1 }.description(),
      "upcoming assignments of user 1"
    );
  }
}
