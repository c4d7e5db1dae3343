use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Integer code or name, as the scheduler and its native client library emit them.
#[derive(Deserialize)]
#[serde(untagged)]
enum StateRepr {
  Code(i64),
  Name(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum NodeState {
  Online,
  Offline,
  #[default]
  Unknown,
}

impl NodeState {
  pub fn from_code(code: i64) -> Self {
    match code {
      0 => NodeState::Online,
      1 => NodeState::Offline,
      _ => NodeState::Unknown,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      NodeState::Online => "Online",
      NodeState::Offline => "Offline",
      NodeState::Unknown => "Unknown",
    }
  }
}

impl<'de> Deserialize<'de> for NodeState {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Ok(match StateRepr::deserialize(deserializer)? {
      StateRepr::Code(code) => NodeState::from_code(code),
      StateRepr::Name(name) => match name.as_str() {
        "Online" => NodeState::Online,
        "Offline" => NodeState::Offline,
        _ => NodeState::Unknown,
      },
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobState {
  Queued,
  Executing,
  Halted,
  Completed,
  Failed,
  Terminated,
}

impl JobState {
  pub const ALL: [JobState; 6] = [
    JobState::Queued,
    JobState::Executing,
    JobState::Halted,
    JobState::Completed,
    JobState::Failed,
    JobState::Terminated,
  ];

  pub fn from_code(code: i64) -> Option<Self> {
    usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
  }

  pub fn code(self) -> i64 {
    self as i64
  }

  pub fn label(self) -> &'static str {
    match self {
      JobState::Queued => "Queued",
      JobState::Executing => "Executing",
      JobState::Halted => "Halted",
      JobState::Completed => "Completed",
      JobState::Failed => "Failed",
      JobState::Terminated => "Terminated",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, JobState::Completed | JobState::Failed | JobState::Terminated)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskState {
  Queued,
  Scheduled,
  Dispatching,
  Executing,
  Completed,
  Failed,
  Aborted,
  Terminated,
}

impl TaskState {
  pub const ALL: [TaskState; 8] = [
    TaskState::Queued,
    TaskState::Scheduled,
    TaskState::Dispatching,
    TaskState::Executing,
    TaskState::Completed,
    TaskState::Failed,
    TaskState::Aborted,
    TaskState::Terminated,
  ];

  pub fn from_code(code: i64) -> Option<Self> {
    usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
  }

  pub fn code(self) -> i64 {
    self as i64
  }

  pub fn label(self) -> &'static str {
    match self {
      TaskState::Queued => "Queued",
      TaskState::Scheduled => "Scheduled",
      TaskState::Dispatching => "Dispatching",
      TaskState::Executing => "Executing",
      TaskState::Completed => "Completed",
      TaskState::Failed => "Failed",
      TaskState::Aborted => "Aborted",
      TaskState::Terminated => "Terminated",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      TaskState::Completed | TaskState::Failed | TaskState::Aborted | TaskState::Terminated
    )
  }
}

macro_rules! deserialize_strict_state {
  ($ty:ident, $what:literal) => {
    impl<'de> Deserialize<'de> for $ty {
      fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match StateRepr::deserialize(deserializer)? {
          StateRepr::Code(code) => $ty::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown {} state code {}", $what, code))),
          StateRepr::Name(name) => $ty::ALL
            .iter()
            .copied()
            .find(|s| s.label() == name)
            .ok_or_else(|| de::Error::custom(format!("unknown {} state {:?}", $what, name))),
        }
      }
    }
  };
}

deserialize_strict_state!(JobState, "job");
deserialize_strict_state!(TaskState, "task");

/// Percentages outside 0..=100, fractions and `null` are brought into range.
fn deserialize_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
  let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
  Ok(value.clamp(0.0, 100.0) as u8)
}

impl fmt::Display for NodeState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl fmt::Display for JobState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl fmt::Display for TaskState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Platform {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuResource {
  #[serde(default)]
  pub cores: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuResource {
  #[serde(default)]
  pub cards: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
  #[serde(default)]
  pub cpu: CpuResource,
  /// Megabytes.
  #[serde(default)]
  pub memory: u64,
  #[serde(default)]
  pub gpu: GpuResource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub name: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub platform: Platform,
  #[serde(default)]
  pub resources: Resources,
  #[serde(default)]
  pub state: NodeState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub name: String,
  pub state: JobState,
  #[serde(default)]
  pub tasks: u32,
  #[serde(default, deserialize_with = "deserialize_progress")]
  pub progress: u8,
  #[serde(default)]
  pub queue: Option<String>,
  #[serde(default)]
  pub priority: Option<i32>,
  #[serde(default)]
  pub submit_time: Option<String>,
  #[serde(default)]
  pub exec_time: Option<String>,
  #[serde(default)]
  pub finish_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub name: String,
  pub state: TaskState,
  #[serde(default)]
  pub node: Option<String>,
  #[serde(default, deserialize_with = "deserialize_progress")]
  pub progress: u8,
  #[serde(default)]
  pub start_time: Option<String>,
  #[serde(default)]
  pub finish_time: Option<String>,
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
  pub id: String,
  #[serde(default)]
  pub cycle: i64,
}
