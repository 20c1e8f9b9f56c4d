use crate::api::types::DEFAULT_COURSE_COLOR;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.url`
pub const API_URL_ENV: &str = "NURSESTUDY_API_URL";
/// Environment variable overriding `log_level`
pub const LOG_ENV: &str = "NURSESTUDY_LOG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for header (defaults to "NurseStudy Pro" if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub profile: ProfileConfig,
  #[serde(default)]
  pub dashboard: DashboardConfig,
  #[serde(default)]
  pub courses: CoursesConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_api_url")]
  pub url: String,
  #[serde(default = "default_user_id")]
  pub user_id: i64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      user_id: default_user_id(),
    }
  }
}

fn default_api_url() -> String {
  "http://localhost:5000".to_string()
}

fn default_user_id() -> i64 {
  1
}

/// Student shown in the dashboard greeting
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
  #[serde(default = "default_profile_name")]
  pub name: String,
  #[serde(default = "default_program")]
  pub program: String,
}

impl Default for ProfileConfig {
  fn default() -> Self {
    Self {
      name: default_profile_name(),
      program: default_program(),
    }
  }
}

fn default_profile_name() -> String {
  "Sarah Johnson".to_string()
}

fn default_program() -> String {
  "Nursing Student".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
  /// Upcoming assignments shown on the dashboard
  #[serde(default = "default_assignment_limit")]
  pub assignment_limit: usize,
  /// Active goals shown on the dashboard
  #[serde(default = "default_goal_limit")]
  pub goal_limit: usize,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      assignment_limit: default_assignment_limit(),
      goal_limit: default_goal_limit(),
    }
  }
}

fn default_assignment_limit() -> usize {
  5
}

fn default_goal_limit() -> usize {
  3
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoursesConfig {
  /// Colour prefilled in the add-course form
  #[serde(default = "default_course_color")]
  pub default_color: String,
}

impl Default for CoursesConfig {
  fn default() -> Self {
    Self {
      default_color: default_course_color(),
    }
  }
}

fn default_course_color() -> String {
  DEFAULT_COURSE_COLOR.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Successful entries older than this are refetched on next read
  pub stale_after_secs: Option<u64>,
}

impl CacheConfig {
  pub fn stale_time(&self) -> Option<Duration> {
    self.stale_after_secs.map(Duration::from_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./nursestudy.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/nursestudy/config.yaml
  ///
  /// Falls back to defaults when no file exists. Environment overrides are
  /// applied last.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("nursestudy.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("nursestudy").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var(API_URL_ENV).filter(|v| !v.is_empty()) {
      self.api.url = url;
    }
    if let Some(level) = var(LOG_ENV).filter(|v| !v.is_empty()) {
      self.log_level = Some(level);
    }
  }

  /// Header title
  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("NurseStudy Pro")
  }

  /// Tracing filter directive
  pub fn log_level(&self) -> &str {
    self.log_level.as_deref().unwrap_or("info")
  }
}
