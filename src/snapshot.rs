use std::fmt::Write;

use serde::Serialize;

use crate::api::{ApiClient, JobQuery};
use crate::error::Result;
use crate::models::ClusterInfo;
use crate::views::{ErrorCell, JobRow, NodeCard, PLACEHOLDER, TaskRow};

/// Everything the console shows, fetched once.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
  pub cluster: ClusterInfo,
  pub nodes: Vec<NodeCard>,
  pub jobs: Vec<JobRow>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tasks: Option<Vec<TaskRow>>,
}

pub async fn fetch(api: &ApiClient, job_id: Option<&str>) -> Result<Snapshot> {
  let query = JobQuery::default();
  let tasks = async {
    match job_id {
      Some(id) => api.list_tasks(id).await.map(Some),
      None => Ok(None),
    }
  };
  let (cluster, nodes, jobs, tasks) =
    futures::try_join!(api.cluster_info(), api.list_nodes(), api.list_jobs(&query), tasks)?;
  Ok(Snapshot {
    cluster,
    nodes: nodes.iter().map(NodeCard::from_node).collect(),
    jobs: jobs.iter().map(JobRow::from_job).collect(),
    tasks: tasks.map(|tasks| tasks.iter().enumerate().map(|(i, t)| TaskRow::from_task(i, t)).collect()),
  })
}

fn cell(value: &Option<String>) -> &str {
  value.as_deref().unwrap_or(PLACEHOLDER)
}

impl Snapshot {
  pub fn to_text(&self) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cluster {} (cycle {})", self.cluster.id, self.cluster.cycle);

    let _ = writeln!(out, "\nNODES");
    for n in &self.nodes {
      let _ = writeln!(
        out,
        "  {:<32} {:<8} {:<20} {} | {} | {} GPU",
        n.title, n.badge.title, n.platform, n.cpu, n.memory, n.gpus
      );
    }

    let _ = writeln!(out, "\nJOBS");
    for j in &self.jobs {
      let _ = writeln!(
        out,
        "  {:<16} {:<20} {:<10} {:>4} tasks {:>3}% {:<19} {:<19}",
        j.id,
        j.name,
        j.badge.label,
        j.tasks,
        j.progress,
        cell(&j.exec_time),
        cell(&j.finish_time)
      );
    }

    if let Some(tasks) = &self.tasks {
      let _ = writeln!(out, "\nTASKS");
      for t in tasks {
        let error = match &t.error {
          ErrorCell::Alert { message } => message.as_str(),
          ErrorCell::None => PLACEHOLDER,
        };
        let _ = writeln!(
          out,
          "  {:>3} {:<20} {:<11} {:<14} {:>3}% {:<19} {:<19} {}",
          t.index,
          t.name,
          t.badge.label,
          t.node,
          t.progress,
          cell(&t.start_time),
          cell(&t.finish_time),
          error
        );
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Job, JobState};

  #[test]
  fn text_lists_every_section() {
    let snapshot = Snapshot {
      cluster: ClusterInfo { id: "lab".into(), cycle: 42 },
      nodes: vec![],
      jobs: vec![JobRow::from_job(&Job {
        id: "j1".into(),
        name: "render".into(),
        state: JobState::Failed,
        tasks: 3,
        progress: 66,
        queue: None,
        priority: None,
        submit_time: None,
        exec_time: None,
        finish_time: None,
      })],
      tasks: None,
    };
    let text = snapshot.to_text();
    assert!(text.starts_with("Cluster lab (cycle 42)"));
    assert!(text.contains("render"));
    assert!(text.contains("Failed"));
    assert!(!text.contains("TASKS"));
  }
}
