use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actions::{self, Action, Effect};
use crate::api::{ApiClient, JobQuery};
use crate::app::{TaskContext, Update};
use crate::poller::{PollHandle, Refresher};

#[derive(Debug, Clone, Copy)]
pub struct Intervals {
  pub nodes: Duration,
  pub jobs: Duration,
  pub tasks: Duration,
}

impl Default for Intervals {
  fn default() -> Self {
    Self {
      nodes: Duration::from_secs(5),
      jobs: Duration::from_secs(2),
      tasks: Duration::from_secs(2),
    }
  }
}

/// Owns the poll loops and runs requests for the interactive console.
/// Everything it learns is pushed to `updates`. Must be used inside a
/// tokio runtime.
pub struct Console {
  api: ApiClient,
  updates: UnboundedSender<Update>,
  intervals: Intervals,
  nodes: Option<PollHandle>,
  jobs: Option<PollHandle>,
  tasks: Option<PollHandle>,
}

impl Console {
  pub fn new(api: ApiClient, updates: UnboundedSender<Update>, intervals: Intervals) -> Self {
    Self { api, updates, intervals, nodes: None, jobs: None, tasks: None }
  }

  pub fn start_nodes(&mut self) {
    let api = self.api.clone();
    let tx = self.updates.clone();
    self.nodes = Some(PollHandle::spawn(
      "nodes",
      self.intervals.nodes,
      move || {
        let api = api.clone();
        async move { api.list_nodes().await }
      },
      move |nodes| {
        let _ = tx.send(Update::Nodes(nodes));
      },
    ));
  }

  pub fn start_jobs(&mut self) {
    let api = self.api.clone();
    let tx = self.updates.clone();
    self.jobs = Some(PollHandle::spawn(
      "jobs",
      self.intervals.jobs,
      move || {
        let api = api.clone();
        async move { api.list_jobs(&JobQuery::default()).await }
      },
      move |jobs| {
        let _ = tx.send(Update::Jobs(jobs));
      },
    ));
  }

  /// Lists the tasks of `context`, replacing whatever task list was open.
  /// Without `update` the list is loaded once.
  pub fn open_tasks(&mut self, context: &TaskContext, update: bool) {
    self.stop_tasks();
    info!("Opening tasks of job {}", context.job_id);
    let api = self.api.clone();
    let tx = self.updates.clone();
    let job_id = context.job_id.clone();
    let handle = if update {
      PollHandle::spawn(
        "tasks",
        self.intervals.tasks,
        move || {
          let api = api.clone();
          let job_id = job_id.clone();
          async move { api.list_tasks(&job_id).await.map(|tasks| (job_id, tasks)) }
        },
        move |(job_id, tasks)| {
          let _ = tx.send(Update::Tasks { job_id, tasks });
        },
      )
    } else {
      PollHandle::once(
        "tasks",
        async move { api.list_tasks(&job_id).await.map(|tasks| (job_id, tasks)) },
        move |(job_id, tasks)| {
          let _ = tx.send(Update::Tasks { job_id, tasks });
        },
      )
    };
    self.tasks = Some(handle);
  }

  pub fn stop_tasks(&mut self) {
    if let Some(handle) = self.tasks.take() {
      handle.stop();
    }
  }

  pub fn stop(&mut self) {
    self.nodes.take();
    self.jobs.take();
    self.stop_tasks();
  }

  pub fn is_polling_tasks(&self) -> bool {
    self.tasks.as_ref().is_some_and(PollHandle::is_running)
  }

  pub fn load_cluster(&self) {
    let api = self.api.clone();
    let tx = self.updates.clone();
    tokio::spawn(async move {
      match api.cluster_info().await {
        Ok(info) => {
          let _ = tx.send(Update::Cluster(info));
        }
        Err(e) => debug!("Loading cluster info failed: {}", e),
      }
    });
  }

  pub fn load_log(&self, task_id: String) {
    let api = self.api.clone();
    let tx = self.updates.clone();
    tokio::spawn(async move {
      let content = api.task_log(&task_id).await.map_err(|e| e.to_string());
      let _ = tx.send(Update::Log { task_id, content });
    });
  }

  fn action_runner(&self) -> ActionRunner {
    ActionRunner {
      api: self.api.clone(),
      updates: self.updates.clone(),
      jobs: self.jobs.as_ref().map(PollHandle::refresher),
      nodes: self.nodes.as_ref().map(PollHandle::refresher),
    }
  }

  /// Sends the request and then applies its effect: a job re-poll, a node
  /// re-poll, or (through the update channel) the removal of a job row.
  pub async fn perform(&self, action: Action) {
    self.action_runner().run(action).await
  }

  /// Like [`Console::perform`], without waiting for the answer.
  pub fn dispatch(&self, action: Action) -> JoinHandle<()> {
    tokio::spawn(self.action_runner().run(action))
  }
}

struct ActionRunner {
  api: ApiClient,
  updates: UnboundedSender<Update>,
  jobs: Option<Refresher>,
  nodes: Option<Refresher>,
}

impl ActionRunner {
  async fn run(self, action: Action) {
    match actions::perform(&self.api, &action).await {
      Ok(effect) => {
        match &effect {
          Effect::RepollJobs => self.jobs.iter().for_each(Refresher::refresh),
          Effect::RepollNodes => self.nodes.iter().for_each(Refresher::refresh),
          Effect::RemoveJob(_) => {}
        }
        let _ = self.updates.send(Update::ActionDone { action, effect });
      }
      Err(e) => {
        let _ = self.updates.send(Update::ActionFailed { action, error: e.to_string() });
      }
    }
  }
}

impl Drop for Console {
  fn drop(&mut self) {
    self.stop();
  }
}
