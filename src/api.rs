use std::time::Duration;

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::models::{ClusterInfo, Job, JobState, Node, Task};

// 100ms, 200ms, 400ms, ... never more than MAX_RETRY_DELAY
const RETRY_BASE: u64 = 2;
const RETRY_FACTOR_MS: u64 = 50;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pauses between the start-up probes; `attempts` probes need one fewer pause.
pub fn connect_backoff(attempts: usize) -> impl Iterator<Item = Duration> {
  ExponentialBackoff::from_millis(RETRY_BASE)
    .factor(RETRY_FACTOR_MS)
    .max_delay(MAX_RETRY_DELAY)
    .take(attempts.saturating_sub(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
  State,
  Submit,
}

/// Filters understood by `GET jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
  pub state: Option<JobState>,
  pub sort: Option<JobSort>,
  pub offset: Option<usize>,
  pub limits: Option<usize>,
}

impl JobQuery {
  fn pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(state) = self.state {
      pairs.push(("state", state.label().to_string()));
    }
    if let Some(sort) = self.sort {
      let sort = match sort {
        JobSort::State => "state",
        JobSort::Submit => "submit",
      };
      pairs.push(("sort", sort.to_string()));
    }
    if let Some(offset) = self.offset {
      pairs.push(("offset", offset.to_string()));
    }
    if let Some(limits) = self.limits {
      pairs.push(("limits", limits.to_string()));
    }
    pairs
  }
}

/// Client for the scheduler's REST API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  base: Url,
}

impl ApiClient {
  pub fn new(base: Url, timeout: Duration) -> Result<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|source| ApiError::Transport { url: base.to_string(), source })?;
    Ok(Self::with_client(http, base))
  }

  pub fn with_client(http: Client, mut base: Url) -> Self {
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    Self { http, base }
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  /// Builds `<base>/<segments...>`, escaping every segment.
  pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| ApiError::Endpoint(self.base.to_string()))?;
      path.pop_if_empty();
      path.extend(segments);
    }
    Ok(url)
  }

  /// Probes the server until it answers, backing off between attempts.
  pub async fn connect(&self, attempts: usize) -> Result<ClusterInfo> {
    let cluster = Retry::spawn(connect_backoff(attempts), || self.cluster_info()).await?;
    info!("Connected to cluster {} at {}", cluster.id, self.base);
    Ok(cluster)
  }

  pub async fn cluster_info(&self) -> Result<ClusterInfo> {
    let url = self.endpoint(&["cluster"])?;
    self.get_json(url).await
  }

  pub async fn healthz(&self) -> Result<()> {
    let url = self.endpoint(&["healthz"])?;
    self.send(Method::GET, url).await.map(drop)
  }

  pub async fn list_nodes(&self) -> Result<Vec<Node>> {
    let url = self.endpoint(&["nodes"])?;
    self.get_list(url).await
  }

  pub async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>> {
    let mut url = self.endpoint(&["jobs"])?;
    let pairs = query.pairs();
    if !pairs.is_empty() {
      url.query_pairs_mut().extend_pairs(pairs);
    }
    self.get_list(url).await
  }

  pub async fn get_job(&self, id: &str) -> Result<Job> {
    let url = self.endpoint(&["jobs", id])?;
    self.get_json(url).await
  }

  pub async fn list_tasks(&self, job_id: &str) -> Result<Vec<Task>> {
    let mut url = self.endpoint(&["tasks"])?;
    url.query_pairs_mut().append_pair("jobid", job_id);
    self.get_list(url).await
  }

  /// Raw log content of a task.
  pub async fn task_log(&self, task_id: &str) -> Result<String> {
    let url = self.endpoint(&["tasks", task_id, "log"])?;
    let text_url = url.to_string();
    let resp = self.send(Method::GET, url).await?;
    resp
      .text()
      .await
      .map_err(|source| ApiError::Transport { url: text_url, source })
  }

  pub async fn terminate_job(&self, id: &str) -> Result<()> {
    let url = self.endpoint(&["jobs", id, "_terminate"])?;
    self.send(Method::PUT, url).await.map(drop)
  }

  pub async fn delete_job(&self, id: &str) -> Result<()> {
    let url = self.endpoint(&["jobs", id])?;
    self.send(Method::DELETE, url).await.map(drop)
  }

  pub async fn set_node_online(&self, name: &str) -> Result<()> {
    let url = self.endpoint(&["nodes", name, "_online"])?;
    self.send(Method::PUT, url).await.map(drop)
  }

  /// With `kill` the node also kills the tasks it is running.
  pub async fn set_node_offline(&self, name: &str, kill: bool) -> Result<()> {
    let mut url = self.endpoint(&["nodes", name, "_offline"])?;
    if kill {
      url.query_pairs_mut().append_pair("kill", "yes");
    }
    self.send(Method::PUT, url).await.map(drop)
  }

  async fn send(&self, method: Method, url: Url) -> Result<Response> {
    let url_text = url.to_string();
    debug!("{} {}", method, url_text);
    let resp = self
      .http
      .request(method, url)
      .send()
      .await
      .map_err(|source| ApiError::Transport { url: url_text.clone(), source })?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status { url: url_text, status, body })
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
    let url_text = url.to_string();
    let resp = self.send(Method::GET, url).await?;
    let body = resp
      .bytes()
      .await
      .map_err(|source| ApiError::Transport { url: url_text.clone(), source })?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Decode { url: url_text, source })
  }

  /// The server answers 404 instead of `[]` when a collection is empty.
  /// Entries that do not decode are skipped, the rest of the list is kept.
  async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
    let url_text = url.to_string();
    let items: Vec<Value> = match self.get_json(url).await {
      Err(err) if err.is_not_found() => return Ok(Vec::new()),
      other => other?,
    };
    Ok(
      items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
          Ok(entry) => Some(entry),
          Err(e) => {
            debug!("Skipping entry of {}: {}", url_text, e);
            None
          }
        })
        .collect(),
    )
  }
}
