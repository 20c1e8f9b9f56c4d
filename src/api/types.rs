//! Serde types matching the NurseStudy backend payloads.
//!
//! All payload keys are camelCase. Numeric goal and stats fields are accepted
//! either as JSON numbers or as numeric strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Colour used for new courses when none is picked
pub const DEFAULT_COURSE_COLOR: &str = "#10b981";

fn default_color() -> String {
  DEFAULT_COURSE_COLOR.to_string()
}

/// A course owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: i64,
  pub name: String,
  pub code: String,
  #[serde(default)]
  pub professor: Option<String>,
  #[serde(default)]
  pub credits: Option<i64>,
  #[serde(default)]
  pub semester: Option<String>,
  #[serde(default)]
  pub current_grade: Option<String>,
  #[serde(default = "default_color")]
  pub color: String,
  #[serde(default)]
  pub user_id: Option<i64>,
}

impl Course {
  /// Grade as shown on badges: "85.5%" or "N/A"
  pub fn grade_label(&self) -> String {
    match self.current_grade.as_deref().map(str::trim) {
      Some(grade) if !grade.is_empty() => format!("{}%", grade),
      _ => "N/A".to_string(),
    }
  }

  pub fn grade_bucket(&self) -> GradeBucket {
    GradeBucket::classify(self.current_grade.as_deref())
  }
}

/// Writable course fields, as collected by the course form.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
  pub name: String,
  pub code: String,
  pub professor: Option<String>,
  pub credits: Option<i64>,
  pub semester: Option<String>,
  pub current_grade: Option<String>,
  pub color: String,
}

/// Request body for POST/PUT: course fields plus the owning user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseBody<'a> {
  #[serde(flatten)]
  pub input: &'a CourseInput,
  pub user_id: i64,
}

/// A course write submitted from the course form
#[derive(Debug, Clone, PartialEq)]
pub enum CourseWrite {
  Create(CourseInput),
  Update { id: i64, input: CourseInput },
}

/// Parse a `#rrggbb` colour into its components
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
  let hex = value.trim().strip_prefix('#')?;
  if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
    return None;
  }
  let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
  Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Display bucket for a course grade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBucket {
  A,
  B,
  C,
  D,
}

impl GradeBucket {
  /// Classify a grade string. Missing or non-numeric grades land in D.
  pub fn classify(grade: Option<&str>) -> Self {
    let value = grade
      .and_then(|g| g.trim().parse::<f64>().ok())
      .unwrap_or(0.0);

    if value >= 90.0 {
      GradeBucket::A
    } else if value >= 80.0 {
      GradeBucket::B
    } else if value >= 70.0 {
      GradeBucket::C
    } else {
      GradeBucket::D
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  High,
  Medium,
  Low,
  #[serde(other)]
  Other,
}

impl Priority {
  pub fn label(&self) -> &'static str {
    match self {
      Priority::High => "high",
      Priority::Medium => "medium",
      Priority::Low => "low",
      Priority::Other => "-",
    }
  }
}

/// Upcoming assignment (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub id: i64,
  pub title: String,
  pub due_date: DateTime<Utc>,
  pub priority: Priority,
  #[serde(default)]
  pub course_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
  Active,
  Completed,
  Paused,
  #[serde(other)]
  Other,
}

/// Study goal (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
  pub id: i64,
  pub title: String,
  pub status: GoalStatus,
  #[serde(deserialize_with = "number_or_string")]
  pub current_value: f64,
  #[serde(deserialize_with = "number_or_string")]
  pub target_value: f64,
  #[serde(default)]
  pub unit: String,
}

impl Goal {
  pub fn is_active(&self) -> bool {
    self.status == GoalStatus::Active
  }

  /// Progress towards the target as a percentage in [0, 100].
  ///
  /// A zero target counts as complete once any progress exists.
  pub fn progress_percent(&self) -> f64 {
    if self.target_value <= 0.0 {
      return if self.current_value > 0.0 { 100.0 } else { 0.0 };
    }
    let percent = self.current_value / self.target_value * 100.0;
    if percent.is_nan() {
      return 0.0;
    }
    percent.clamp(0.0, 100.0)
  }
}

/// Aggregate dashboard numbers. Missing fields read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
  #[serde(deserialize_with = "number_or_string")]
  pub weekly_hours: f64,
  #[serde(deserialize_with = "number_or_string")]
  pub assignments: f64,
  #[serde(deserialize_with = "number_or_string")]
  pub clinical_hours: f64,
  #[serde(deserialize_with = "number_or_string")]
  pub average_grade: f64,
}

/// Accept `12`, `12.5`, `"12.5"` or `null` (as 0) for numeric fields.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Number(f64),
    Text(String),
    Null(()),
  }

  match Raw::deserialize(deserializer)? {
    Raw::Number(n) => Ok(n),
    Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
    Raw::Text(s) => s
      .trim()
      .parse()
      .map_err(|_| serde::de::Error::custom(format!("invalid number: {:?}", s))),
    Raw::Null(()) => Ok(0.0),
  }
}

/// Format a number without a trailing ".0" for whole values
pub fn format_number(value: f64) -> String {
  if value.fract() == 0.0 {
    format!("{}", value as i64)
  } else {
    format!("{:.1}", value)
  }
}
