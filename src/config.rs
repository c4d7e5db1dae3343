use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use reqwest::Url;

/// Default REST port of the LightSched API server.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:20516/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  Text,
  Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "lightsched-console", version, about = "Terminal console for a LightSched cluster")]
pub struct Config {
  /// Base URL of the API server
  #[arg(long, env = "LIGHTSCHED_SERVER", default_value = DEFAULT_SERVER)]
  pub server: Url,

  #[arg(long, env = "LIGHTSCHED_NODE_POLL_SECS", default_value_t = 5)]
  pub node_poll_secs: u64,

  #[arg(long, env = "LIGHTSCHED_JOB_POLL_SECS", default_value_t = 2)]
  pub job_poll_secs: u64,

  #[arg(long, env = "LIGHTSCHED_TASK_POLL_SECS", default_value_t = 2)]
  pub task_poll_secs: u64,

  /// Per-request timeout
  #[arg(long, env = "LIGHTSCHED_TIMEOUT_SECS", default_value_t = 10)]
  pub timeout_secs: u64,

  /// Attempts made to reach the server before giving up at start up
  #[arg(long, env = "LIGHTSCHED_CONNECT_RETRIES", default_value_t = 5)]
  pub connect_retries: usize,

  /// Open the task list of this job
  #[arg(long)]
  pub jobid: Option<String>,

  #[arg(long, requires = "jobid")]
  pub jobname: Option<String>,

  /// Keep polling the task list; `--update false` loads it once
  #[arg(long, default_value_t = true, action = ArgAction::Set)]
  pub update: bool,

  /// Print a snapshot and exit instead of starting the console
  #[arg(long)]
  pub once: bool,

  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,

  #[arg(long, env = "LIGHTSCHED_LOG_FILE")]
  pub log_file: Option<PathBuf>,
}

impl Config {
  pub fn node_interval(&self) -> Duration {
    Duration::from_secs(self.node_poll_secs.max(1))
  }

  pub fn job_interval(&self) -> Duration {
    Duration::from_secs(self.job_poll_secs.max(1))
  }

  pub fn task_interval(&self) -> Duration {
    Duration::from_secs(self.task_poll_secs.max(1))
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs.max(1))
  }
}
