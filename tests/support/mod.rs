//! In-process stand-in for the LightSched API server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lightsched_console::api::ApiClient;
use reqwest::Url;
use serde_json::{Value, json};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

#[derive(Default)]
pub struct Backend {
  pub nodes: Vec<Value>,
  pub jobs: Vec<Value>,
  pub tasks: HashMap<String, Vec<Value>>,
  pub logs: HashMap<String, String>,
  /// `METHOD /path?query` of every request, in arrival order.
  pub hits: Vec<String>,
}

impl Backend {
  pub fn count(&self, hit: &str) -> usize {
    self.hits.iter().filter(|h| h.as_str() == hit).count()
  }
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct MockScheduler {
  pub backend: Shared,
  pub base: Url,
}

impl MockScheduler {
  pub async fn start(backend: Backend) -> Self {
    let backend = Arc::new(Mutex::new(backend));
    let (addr, server) = warp::serve(routes(backend.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    let base = Url::parse(&format!("http://{}/", addr)).unwrap();
    Self { backend, base }
  }

  pub fn client(&self) -> ApiClient {
    ApiClient::new(self.base.clone(), Duration::from_secs(5)).unwrap()
  }

  pub fn count(&self, hit: &str) -> usize {
    self.backend.lock().unwrap().count(hit)
  }
}

pub fn node(name: &str, state: i64) -> Value {
  json!({
    "name": name,
    "address": "10.0.0.2",
    "platform": {"name": "Ubuntu 20.04"},
    "resources": {"cpu": {"cores": 8}, "memory": 32000, "gpu": {"cards": 1}},
    "state": state
  })
}

pub fn job(id: &str, state: i64) -> Value {
  json!({
    "id": id,
    "name": format!("job {}", id),
    "state": state,
    "tasks": 2,
    "progress": 50,
    "exec_time": "2020-06-01T08:30:15+08:00",
    "finish_time": "0001-01-01T00:00:00Z"
  })
}

pub fn task(id: &str, state: i64) -> Value {
  json!({"id": id, "name": id, "state": state, "node": "gpu-01", "progress": 10})
}

fn with_backend(backend: Shared) -> impl Filter<Extract = (Shared,), Error = Infallible> + Clone {
  warp::any().map(move || backend.clone())
}

fn record(backend: &Shared, hit: String) {
  backend.lock().unwrap().hits.push(hit);
}

fn list_or_404(items: Vec<Value>) -> Response {
  if items.is_empty() {
    StatusCode::NOT_FOUND.into_response()
  } else {
    warp::reply::json(&items).into_response()
  }
}

fn set_node_state(backend: &Shared, name: &str, state: i64) -> Response {
  let mut b = backend.lock().unwrap();
  match b.nodes.iter_mut().find(|n| n["name"] == name) {
    Some(node) => {
      node["state"] = json!(state);
      StatusCode::OK.into_response()
    }
    None => warp::reply::with_status(format!("node {} not found", name), StatusCode::NOT_FOUND).into_response(),
  }
}

pub fn routes(backend: Shared) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
  let cluster = warp::get()
    .and(warp::path!("cluster"))
    .and(with_backend(backend.clone()))
    .map(|b: Shared| {
      record(&b, "GET /cluster".into());
      warp::reply::json(&json!({"id": "test-cluster", "cycle": 7})).into_response()
    });

  let healthz = warp::get()
    .and(warp::path!("healthz"))
    .and(with_backend(backend.clone()))
    .map(|b: Shared| {
      record(&b, "GET /healthz".into());
      warp::reply::json(&json!({"status": "ok"})).into_response()
    });

  let nodes = warp::get()
    .and(warp::path!("nodes"))
    .and(with_backend(backend.clone()))
    .map(|b: Shared| {
      record(&b, "GET /nodes".into());
      let nodes = b.lock().unwrap().nodes.clone();
      list_or_404(nodes)
    });

  let online = warp::put()
    .and(warp::path!("nodes" / String / "_online"))
    .and(with_backend(backend.clone()))
    .map(|name: String, b: Shared| {
      record(&b, format!("PUT /nodes/{}/_online", name));
      set_node_state(&b, &name, 0)
    });

  let offline = warp::put()
    .and(warp::path!("nodes" / String / "_offline"))
    .and(warp::query::<HashMap<String, String>>())
    .and(with_backend(backend.clone()))
    .map(|name: String, query: HashMap<String, String>, b: Shared| {
      let kill = query.get("kill").map(|k| format!("?kill={}", k)).unwrap_or_default();
      record(&b, format!("PUT /nodes/{}/_offline{}", name, kill));
      set_node_state(&b, &name, 1)
    });

  let jobs = warp::get()
    .and(warp::path!("jobs"))
    .and(warp::query::<HashMap<String, String>>())
    .and(with_backend(backend.clone()))
    .map(|query: HashMap<String, String>, b: Shared| {
      record(&b, "GET /jobs".into());
      let mut jobs = b.lock().unwrap().jobs.clone();
      if let Some(limits) = query.get("limits").and_then(|l| l.parse().ok()) {
        jobs.truncate(limits);
      }
      list_or_404(jobs)
    });

  let get_job = warp::get()
    .and(warp::path!("jobs" / String))
    .and(with_backend(backend.clone()))
    .map(|id: String, b: Shared| {
      record(&b, format!("GET /jobs/{}", id));
      let job = b.lock().unwrap().jobs.iter().find(|j| j["id"] == id.as_str()).cloned();
      match job {
        Some(job) => warp::reply::json(&job).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
      }
    });

  let terminate = warp::put()
    .and(warp::path!("jobs" / String / "_terminate"))
    .and(with_backend(backend.clone()))
    .map(|id: String, b: Shared| {
      record(&b, format!("PUT /jobs/{}/_terminate", id));
      let mut b = b.lock().unwrap();
      match b.jobs.iter_mut().find(|j| j["id"] == id.as_str()) {
        Some(job) => {
          job["state"] = json!(5);
          StatusCode::ACCEPTED.into_response()
        }
        None => warp::reply::with_status("Unable to terminate job: not found".to_string(), StatusCode::BAD_REQUEST)
          .into_response(),
      }
    });

  let delete = warp::delete()
    .and(warp::path!("jobs" / String))
    .and(with_backend(backend.clone()))
    .map(|id: String, b: Shared| {
      record(&b, format!("DELETE /jobs/{}", id));
      let mut b = b.lock().unwrap();
      let before = b.jobs.len();
      b.jobs.retain(|j| j["id"] != id.as_str());
      if b.jobs.len() < before {
        StatusCode::OK.into_response()
      } else {
        warp::reply::with_status("Unable to delete job: not found".to_string(), StatusCode::BAD_REQUEST).into_response()
      }
    });

  let tasks = warp::get()
    .and(warp::path!("tasks"))
    .and(warp::query::<HashMap<String, String>>())
    .and(with_backend(backend.clone()))
    .map(|query: HashMap<String, String>, b: Shared| {
      let job_id = query.get("jobid").cloned().unwrap_or_default();
      record(&b, format!("GET /tasks?jobid={}", job_id));
      let tasks = b.lock().unwrap().tasks.get(&job_id).cloned().unwrap_or_default();
      list_or_404(tasks)
    });

  let log = warp::get()
    .and(warp::path!("tasks" / String / "log"))
    .and(with_backend(backend))
    .map(|id: String, b: Shared| {
      record(&b, format!("GET /tasks/{}/log", id));
      let log = b.lock().unwrap().logs.get(&id).cloned();
      match log {
        Some(text) => text.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
      }
    });

  cluster
    .or(healthz)
    .unify()
    .or(nodes)
    .unify()
    .or(online)
    .unify()
    .or(offline)
    .unify()
    .or(jobs)
    .unify()
    .or(get_job)
    .unify()
    .or(terminate)
    .unify()
    .or(delete)
    .unify()
    .or(tasks)
    .unify()
    .or(log)
    .unify()
}
