use crate::api::gateway::Gateway;
use crate::api::types::{Assignment, Course, CourseBody, CourseInput, DashboardStats, Goal};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for the NurseStudy REST backend
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API url {}: {}", config.api.url, e))?;

    if base.cannot_be_a_base() {
      return Err(eyre!("Invalid API url {}: not a base url", config.api.url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("nursestudy/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Host (and port) of the backend, for the header
  pub fn host(&self) -> String {
    match (self.base.host_str(), self.base.port()) {
      (Some(host), Some(port)) => format!("{}:{}", host, port),
      (Some(host), None) => host.to_string(),
      _ => self.base.to_string(),
    }
  }

  /// Build an endpoint url below the configured base
  fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| eyre!("API url cannot be a base: {}", self.base))?
      .pop_if_empty()
      .extend(segments);

    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
  }

  async fn send(
    &self,
    method: Method,
    url: Url,
    body: Option<&(impl Serialize + Sync)>,
    action: &str,
  ) -> Result<Response> {
    debug!(%method, %url, "request");

    let mut request = self.http.request(method, url);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", action, e))?;

    let status = response.status();
    if !status.is_success() {
      warn!(%status, action, "request failed");
      return Err(eyre!("Failed to {}: HTTP {}", action, status));
    }

    Ok(response)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url, action: &str) -> Result<T> {
    let response = self.send(Method::GET, url, None::<&()>, action).await?;
    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", action, e))
  }

  async fn write_course(
    &self,
    method: Method,
    url: Url,
    body: CourseBody<'_>,
    action: &str,
  ) -> Result<Course> {
    let response = self.send(method, url, Some(&body), action).await?;
    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", action, e))
  }
}

impl Gateway for ApiClient {
  fn list_courses(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Course>>> {
    async move {
      let user = user_id.to_string();
      let url = self.endpoint(&["api", "courses"], &[("userId", user.as_str())])?;
      self.get_json(url, "fetch courses").await
    }
    .boxed()
  }

  fn create_course<'a>(
    &'a self,
    user_id: i64,
    input: &'a CourseInput,
  ) -> BoxFuture<'a, Result<Course>> {
    async move {
      let url = self.endpoint(&["api", "courses"], &[])?;
      let body = CourseBody { input, user_id };
      self
        .write_course(Method::POST, url, body, "create course")
        .await
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
      let id = id.to_string();
      let url = self.endpoint(&["api", "courses", id.as_str()], &[])?;
      let body = CourseBody { input, user_id };
      self
        .write_course(Method::PUT, url, body, "update course")
        .await
    }
    .boxed()
  }

  fn delete_course(&self, id: i64) -> BoxFuture<'_, Result<()>> {
    async move {
      let id = id.to_string();
      let url = self.endpoint(&["api", "courses", id.as_str()], &[])?;
      // Response body is not part of the contract
      self
        .send(Method::DELETE, url, None::<&()>, "delete course")
        .await?;
      Ok(())
    }
    .boxed()
  }

  fn dashboard_stats(&self, user_id: i64) -> BoxFuture<'_, Result<DashboardStats>> {
    async move {
      let user = user_id.to_string();
      let url = self.endpoint(&["api", "dashboard-stats", user.as_str()], &[])?;
      self.get_json(url, "fetch stats").await
    }
    .boxed()
  }

  fn upcoming_assignments(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Assignment>>> {
    async move {
      let user = user_id.to_string();
      let url = self.endpoint(
        &["api", "assignments"],
        &[("userId", user.as_str()), ("upcoming", "true")],
      )?;
      self.get_json(url, "fetch assignments").await
    }
    .boxed()
  }

  fn list_goals(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Goal>>> {
    async move {
      let user = user_id.to_string();
      let url = self.endpoint(&["api", "goals"], &[("userId", user.as_str())])?;
      self.get_json(url, "fetch goals").await
    }
    .boxed()
  }
}
