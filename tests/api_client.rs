mod support;

use lightsched_console::api::{ApiClient, JobQuery};
use lightsched_console::error::ApiError;
use lightsched_console::models::{JobState, NodeState, TaskState};
use lightsched_console::snapshot;
use reqwest::Url;
use support::{Backend, MockScheduler, job, node, task};
use tokio_test::assert_ok;

#[tokio::test]
async fn lists_nodes_jobs_and_tasks() {
  let mut backend = Backend {
    nodes: vec![node("gpu-01", 0), node("gpu-02", 2)],
    jobs: vec![job("j1", 1), job("j2", 3)],
    ..Default::default()
  };
  backend.tasks.insert("j1".into(), vec![task("j1.0.0", 3), task("j1.0.1", 6)]);
  let mock = MockScheduler::start(backend).await;
  let api = mock.client();

  let nodes = assert_ok!(api.list_nodes().await);
  assert_eq!(nodes.len(), 2);
  assert_eq!(nodes[1].state, NodeState::Unknown);

  let jobs = assert_ok!(api.list_jobs(&JobQuery::default()).await);
  assert_eq!(jobs.iter().map(|j| j.state).collect::<Vec<_>>(), vec![JobState::Executing, JobState::Completed]);

  let tasks = assert_ok!(api.list_tasks("j1").await);
  assert_eq!(tasks[1].state, TaskState::Aborted);
  assert_eq!(tasks[0].node.as_deref(), Some("gpu-01"));
  assert_eq!(mock.count("GET /tasks?jobid=j1"), 1);
}

#[tokio::test]
async fn empty_collections_come_back_as_404() {
  let mock = MockScheduler::start(Backend::default()).await;
  let api = mock.client();
  assert!(assert_ok!(api.list_nodes().await).is_empty());
  assert!(assert_ok!(api.list_jobs(&JobQuery::default()).await).is_empty());
  assert!(assert_ok!(api.list_tasks("nope").await).is_empty());
}

#[tokio::test]
async fn job_query_is_forwarded() {
  let backend = Backend { jobs: vec![job("j1", 0), job("j2", 0), job("j3", 0)], ..Default::default() };
  let mock = MockScheduler::start(backend).await;
  let query = JobQuery { limits: Some(2), ..Default::default() };
  let jobs = assert_ok!(mock.client().list_jobs(&query).await);
  assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn fetches_single_job() {
  let backend = Backend { jobs: vec![job("j1", 4)], ..Default::default() };
  let mock = MockScheduler::start(backend).await;
  let api = mock.client();
  assert_eq!(assert_ok!(api.get_job("j1").await).state, JobState::Failed);
  assert!(api.get_job("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn task_log_is_raw_text() {
  let mut backend = Backend::default();
  backend.logs.insert("j1.0.0".into(), "line 1\nline 2<br>".into());
  let mock = MockScheduler::start(backend).await;
  let api = mock.client();
  assert_eq!(assert_ok!(api.task_log("j1.0.0").await), "line 1\nline 2<br>");
  assert!(api.task_log("j1.0.9").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn mutations_hit_the_documented_paths() {
  let backend = Backend {
    nodes: vec![node("n1", 0)],
    jobs: vec![job("j1", 1), job("j2", 3)],
    ..Default::default()
  };
  let mock = MockScheduler::start(backend).await;
  let api = mock.client();

  assert_ok!(api.terminate_job("j1").await);
  assert_ok!(api.delete_job("j2").await);
  assert_ok!(api.set_node_offline("n1", true).await);
  assert_ok!(api.set_node_online("n1").await);

  let hits = mock.backend.lock().unwrap().hits.clone();
  assert_eq!(
    hits,
    vec![
      "PUT /jobs/j1/_terminate",
      "DELETE /jobs/j2",
      "PUT /nodes/n1/_offline?kill=yes",
      "PUT /nodes/n1/_online",
    ]
  );
}

#[tokio::test]
async fn rejected_requests_carry_the_server_message() {
  let mock = MockScheduler::start(Backend::default()).await;
  let err = mock.client().delete_job("ghost").await.unwrap_err();
  match err {
    ApiError::Status { status, body, .. } => {
      assert_eq!(status.as_u16(), 400);
      assert!(body.contains("Unable to delete job"));
    }
    other => panic!("unexpected error {:?}", other),
  }
}

#[tokio::test]
async fn odd_entries_do_not_hide_the_rest_of_a_list() {
  let backend = Backend {
    nodes: vec![node("gpu-01", 0), serde_json::json!({"name": "gpu-02"})],
    jobs: vec![
      job("j1", 1),
      serde_json::json!({"id": "j2", "name": "x", "state": 42}),
      serde_json::json!({"id": "j3", "name": "y", "state": 0, "progress": -1}),
    ],
    ..Default::default()
  };
  let mock = MockScheduler::start(backend).await;
  let api = mock.client();

  let jobs = assert_ok!(api.list_jobs(&JobQuery::default()).await);
  assert_eq!(jobs.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(), vec!["j1", "j3"]);
  assert_eq!(jobs[1].progress, 0);

  let nodes = assert_ok!(api.list_nodes().await);
  assert_eq!(nodes.len(), 2);
  assert_eq!(nodes[1].state, NodeState::Unknown);
}

#[tokio::test]
async fn connect_reads_cluster_info() {
  let mock = MockScheduler::start(Backend::default()).await;
  let cluster = assert_ok!(mock.client().connect(3).await);
  assert_eq!(cluster.id, "test-cluster");
  assert_eq!(cluster.cycle, 7);
}

#[tokio::test]
async fn health_probe() {
  let mock = MockScheduler::start(Backend::default()).await;
  assert_ok!(mock.client().healthz().await);
  assert_eq!(mock.count("GET /healthz"), 1);
}

#[tokio::test]
async fn connect_gives_up_after_retries() {
  let api = ApiClient::new(Url::parse("http://127.0.0.1:9/").unwrap(), std::time::Duration::from_secs(1)).unwrap();
  let err = api.connect(2).await.unwrap_err();
  assert!(matches!(err, ApiError::Transport { .. }), "{:?}", err);
}

#[tokio::test]
async fn snapshot_renders_all_lists() {
  let mut backend = Backend {
    nodes: vec![node("gpu-01", 1)],
    jobs: vec![job("j1", 4)],
    ..Default::default()
  };
  backend.tasks.insert(
    "j1".into(),
    vec![serde_json::json!({"id": "j1.0.0", "name": "frame", "state": 5, "error": "exit status 2"})],
  );
  let mock = MockScheduler::start(backend).await;
  let snap = assert_ok!(snapshot::fetch(&mock.client(), Some("j1")).await);
  assert_eq!(snap.nodes[0].badge.icon, "offline.png");
  assert_eq!(snap.jobs[0].exec_time.as_deref(), Some("2020-06-01 08:30:15"));
  let tasks = snap.tasks.as_ref().unwrap();
  assert_eq!(tasks[0].index, 1);

  let text = snap.to_text();
  assert!(text.contains("exit status 2"));
  let json = serde_json::to_value(&snap).unwrap();
  assert_eq!(json["tasks"][0]["error"]["kind"], "alert");
  assert_eq!(json["tasks"][0]["error"]["message"], "exit status 2");
}
