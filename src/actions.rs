use std::fmt;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::Result;

/// A user-confirmed mutation of cluster state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  TerminateJob(String),
  DeleteJob(String),
  SetNodeOnline(String),
  SetNodeOffline(String),
}

/// What the console does locally once an action went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  RepollJobs,
  RemoveJob(String),
  RepollNodes,
}

impl Action {
  /// Question shown before the request is sent.
  pub fn prompt(&self) -> String {
    match self {
      Action::TerminateJob(id) => format!("Terminate job {}?", id),
      Action::DeleteJob(id) => format!("Delete the record of job {}?", id),
      Action::SetNodeOnline(name) => format!("Bring node {} online?", name),
      Action::SetNodeOffline(name) => format!("Take node {} offline?", name),
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::TerminateJob(id) => write!(f, "terminate job {}", id),
      Action::DeleteJob(id) => write!(f, "delete job {}", id),
      Action::SetNodeOnline(name) => write!(f, "set node {} online", name),
      Action::SetNodeOffline(name) => write!(f, "set node {} offline", name),
    }
  }
}

pub async fn perform(api: &ApiClient, action: &Action) -> Result<Effect> {
  let result = match action {
    Action::TerminateJob(id) => api.terminate_job(id).await.map(|_| Effect::RepollJobs),
    Action::DeleteJob(id) => api.delete_job(id).await.map(|_| Effect::RemoveJob(id.clone())),
    Action::SetNodeOnline(name) => api.set_node_online(name).await.map(|_| Effect::RepollNodes),
    Action::SetNodeOffline(name) => api.set_node_offline(name, false).await.map(|_| Effect::RepollNodes),
  };
  match &result {
    Ok(_) => info!("Request to {} accepted", action),
    Err(e) => warn!("Unable to {}: {}", action, e),
  }
  result
}
