//! View-models for the three lists. Each row is built once per poll from the
//! wire document and carries everything the renderers need.

use chrono::DateTime;
use serde::Serialize;

use crate::models::{Job, JobState, Node, NodeState, Task, TaskState};
use crate::table::Row;

pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BarStyle {
  Info,
  Active,
  Warning,
  Success,
  Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateBadge {
  pub code: i64,
  pub label: &'static str,
  pub tooltip: &'static str,
}

/// Trims a backend timestamp to `YYYY-MM-DD HH:MM:SS`. Unset (Go zero)
/// times render as `None`.
pub fn trim_timestamp(raw: Option<&str>) -> Option<String> {
  let raw = raw?.trim();
  if raw.is_empty() || raw.starts_with("0001-01-01") {
    return None;
  }
  match DateTime::parse_from_rfc3339(raw) {
    Ok(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
    Err(_) => Some(raw.chars().take(19).collect::<String>().replacen('T', " ", 1)),
  }
}

pub fn job_badge(state: JobState) -> StateBadge {
  let tooltip = match state {
    JobState::Queued => "Waiting in queue",
    JobState::Executing => "Tasks are executing",
    JobState::Halted => "Halted, pending tasks are not scheduled",
    JobState::Completed => "All tasks completed",
    JobState::Failed => "Too many tasks failed",
    JobState::Terminated => "Terminated by user",
  };
  StateBadge { code: state.code(), label: state.label(), tooltip }
}

pub fn task_badge(state: TaskState) -> StateBadge {
  let tooltip = match state {
    TaskState::Queued => "Waiting to be scheduled",
    TaskState::Scheduled => "Assigned to a node",
    TaskState::Dispatching => "Being dispatched to its node",
    TaskState::Executing => "Executing",
    TaskState::Completed => "Completed",
    TaskState::Failed => "Failed",
    TaskState::Aborted => "Aborted abnormally",
    TaskState::Terminated => "Terminated",
  };
  StateBadge { code: state.code(), label: state.label(), tooltip }
}

pub fn job_bar_style(state: JobState) -> BarStyle {
  match state {
    JobState::Queued => BarStyle::Info,
    JobState::Executing => BarStyle::Active,
    JobState::Halted => BarStyle::Warning,
    JobState::Completed => BarStyle::Success,
    JobState::Failed | JobState::Terminated => BarStyle::Danger,
  }
}

pub fn task_bar_style(state: TaskState) -> BarStyle {
  match state {
    TaskState::Queued | TaskState::Scheduled | TaskState::Dispatching => BarStyle::Info,
    TaskState::Executing => BarStyle::Active,
    TaskState::Completed => BarStyle::Success,
    TaskState::Failed | TaskState::Aborted | TaskState::Terminated => BarStyle::Danger,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRow {
  pub id: String,
  pub name: String,
  pub state: JobState,
  pub badge: StateBadge,
  pub tasks: u32,
  pub progress: u8,
  pub bar: BarStyle,
  pub exec_time: Option<String>,
  pub finish_time: Option<String>,
  pub cancel_enabled: bool,
  pub delete_enabled: bool,
}

impl JobRow {
  pub fn from_job(job: &Job) -> Self {
    let terminal = job.state.is_terminal();
    Self {
      id: job.id.clone(),
      name: job.name.clone(),
      state: job.state,
      badge: job_badge(job.state),
      tasks: job.tasks,
      progress: job.progress.min(100),
      bar: job_bar_style(job.state),
      exec_time: trim_timestamp(job.exec_time.as_deref()),
      finish_time: trim_timestamp(job.finish_time.as_deref()),
      cancel_enabled: !terminal,
      delete_enabled: terminal,
    }
  }
}

impl Row for JobRow {
  type Key = String;

  fn key(&self) -> String {
    self.id.clone()
  }

  fn is_terminal(&self) -> bool {
    self.state.is_terminal()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorCell {
  None,
  Alert { message: String },
}

impl ErrorCell {
  pub fn from_error(error: Option<&str>) -> Self {
    match error.map(str::trim) {
      Some(message) if !message.is_empty() => ErrorCell::Alert { message: message.to_string() },
      _ => ErrorCell::None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
  pub index: usize,
  pub id: String,
  pub name: String,
  pub state: TaskState,
  pub badge: StateBadge,
  pub node: String,
  pub progress: u8,
  pub bar: BarStyle,
  pub start_time: Option<String>,
  pub finish_time: Option<String>,
  pub error: ErrorCell,
}

impl TaskRow {
  /// `position` is the zero-based place of the task in the poll response.
  pub fn from_task(position: usize, task: &Task) -> Self {
    Self {
      index: position + 1,
      id: task.id.clone(),
      name: task.name.clone(),
      state: task.state,
      badge: task_badge(task.state),
      node: task
        .node
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string(),
      progress: task.progress.min(100),
      bar: task_bar_style(task.state),
      start_time: trim_timestamp(task.start_time.as_deref()),
      finish_time: trim_timestamp(task.finish_time.as_deref()),
      error: ErrorCell::from_error(task.error.as_deref()),
    }
  }
}

impl Row for TaskRow {
  type Key = String;

  fn key(&self) -> String {
    self.id.clone()
  }

  fn is_terminal(&self) -> bool {
    self.state.is_terminal()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeToggle {
  /// Take the node offline.
  Offline,
  /// Bring the node back online.
  Online,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeBadge {
  pub icon: &'static str,
  pub title: &'static str,
  pub action: Option<NodeToggle>,
}

pub fn node_badge(state: NodeState) -> NodeBadge {
  match state {
    NodeState::Online => NodeBadge { icon: "online.png", title: "Online", action: Some(NodeToggle::Offline) },
    NodeState::Offline => NodeBadge { icon: "offline.png", title: "Offline", action: Some(NodeToggle::Online) },
    NodeState::Unknown => NodeBadge { icon: "unknown.png", title: "Unknown", action: None },
  }
}

pub fn format_memory(megabytes: u64) -> String {
  if megabytes >= 1024 {
    format!("{:.1} GB", megabytes as f64 / 1024.0)
  } else {
    format!("{} MB", megabytes)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCard {
  pub name: String,
  pub title: String,
  pub platform: String,
  pub cpu: String,
  pub memory: String,
  pub gpus: u32,
  pub state: NodeState,
  pub badge: NodeBadge,
}

impl NodeCard {
  pub fn from_node(node: &Node) -> Self {
    let cores = node.resources.cpu.cores;
    Self {
      name: node.name.clone(),
      title: format!("{} ({})", node.name, node.address),
      platform: node.platform.name.clone(),
      cpu: if cores.fract() == 0.0 { format!("{} cores", cores) } else { format!("{:.1} cores", cores) },
      memory: format_memory(node.resources.memory),
      gpus: node.resources.gpu.cards,
      state: node.state,
      badge: node_badge(node.state),
    }
  }
}

impl Row for NodeCard {
  type Key = String;

  fn key(&self) -> String {
    self.name.clone()
  }
}
