use std::collections::HashSet;

use crossterm::event::KeyCode;

use crate::actions::{Action, Effect};
use crate::models::{ClusterInfo, Job, Node, Task};
use crate::table::{Placement, Row, RowTable};
use crate::views::{JobRow, NodeCard, NodeToggle, TaskRow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardTab {
  Nodes,
  Jobs,
  Tasks,
}

impl DashboardTab {
  pub const TITLES: [&'static str; 3] = ["Nodes", "Jobs", "Tasks"];

  pub fn index(self) -> usize {
    match self {
      DashboardTab::Nodes => 0,
      DashboardTab::Jobs => 1,
      DashboardTab::Tasks => 2,
    }
  }
}

/// The job whose tasks are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
  pub job_id: String,
  pub job_name: Option<String>,
}

impl TaskContext {
  pub fn title(&self) -> String {
    match &self.job_name {
      Some(name) => format!("{} ({})", name, self.job_id),
      None => self.job_id.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
  pub task_id: String,
  pub task_name: String,
  /// `None` while loading.
  pub content: Option<Result<String, String>>,
  pub scroll: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
  None,
  Confirm(Action),
  Alert(String),
  Log(LogView),
}

/// Results coming back from the pollers and one-shot requests.
#[derive(Debug, Clone)]
pub enum Update {
  Cluster(ClusterInfo),
  Nodes(Vec<Node>),
  Jobs(Vec<Job>),
  Tasks { job_id: String, tasks: Vec<Task> },
  Log { task_id: String, content: Result<String, String> },
  ActionDone { action: Action, effect: Effect },
  ActionFailed { action: Action, error: String },
}

/// Work the console has to start on behalf of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// `update` is false for finished jobs, whose tasks no longer change.
  OpenTasks { context: TaskContext, update: bool },
  Perform(Action),
  LoadLog(String),
  Quit,
}

pub struct App {
  pub current_tab: DashboardTab,
  pub cluster: Option<ClusterInfo>,
  pub nodes: RowTable<NodeCard>,
  pub jobs: RowTable<JobRow>,
  pub tasks: RowTable<TaskRow>,
  pub task_context: Option<TaskContext>,
  pub modal: Modal,
  pub status: Option<String>,
  /// Selected row of each tab, by id, so polls that reorder rows keep it.
  selected: [Option<String>; 3],
  /// Jobs deleted here; a poll already in flight may still list them.
  deleted_jobs: HashSet<String>,
}

impl Default for App {
  fn default() -> Self {
    Self::new(None)
  }
}

impl App {
  pub fn new(task_context: Option<TaskContext>) -> Self {
    Self {
      current_tab: if task_context.is_some() { DashboardTab::Tasks } else { DashboardTab::Nodes },
      cluster: None,
      nodes: RowTable::new(),
      jobs: RowTable::new(),
      tasks: RowTable::new(),
      task_context,
      modal: Modal::None,
      status: None,
      selected: [None, None, None],
      deleted_jobs: HashSet::new(),
    }
  }

  pub fn next_tab(&mut self) {
    self.current_tab = match self.current_tab {
      DashboardTab::Nodes => DashboardTab::Jobs,
      DashboardTab::Jobs => DashboardTab::Tasks,
      DashboardTab::Tasks => DashboardTab::Nodes,
    }
  }

  pub fn previous_tab(&mut self) {
    self.current_tab = match self.current_tab {
      DashboardTab::Nodes => DashboardTab::Tasks,
      DashboardTab::Jobs => DashboardTab::Nodes,
      DashboardTab::Tasks => DashboardTab::Jobs,
    }
  }

  /// Position of the selected row, for the renderers.
  pub fn selected(&self, tab: DashboardTab) -> usize {
    self.selected[tab.index()]
      .as_ref()
      .and_then(|key| self.position_of(tab, key))
      .unwrap_or(0)
  }

  fn row_count(&self, tab: DashboardTab) -> usize {
    match tab {
      DashboardTab::Nodes => self.nodes.len(),
      DashboardTab::Jobs => self.jobs.len(),
      DashboardTab::Tasks => self.tasks.len(),
    }
  }

  fn position_of(&self, tab: DashboardTab, key: &String) -> Option<usize> {
    match tab {
      DashboardTab::Nodes => self.nodes.position(key),
      DashboardTab::Jobs => self.jobs.position(key),
      DashboardTab::Tasks => self.tasks.position(key),
    }
  }

  fn key_at(&self, tab: DashboardTab, position: usize) -> Option<String> {
    match tab {
      DashboardTab::Nodes => self.nodes.rows().get(position).map(Row::key),
      DashboardTab::Jobs => self.jobs.rows().get(position).map(Row::key),
      DashboardTab::Tasks => self.tasks.rows().get(position).map(Row::key),
    }
  }

  fn select(&mut self, tab: DashboardTab, position: usize) {
    let position = position.min(self.row_count(tab).saturating_sub(1));
    self.selected[tab.index()] = self.key_at(tab, position);
  }

  fn move_selection(&mut self, down: bool) {
    let tab = self.current_tab;
    let current = self.selected(tab);
    let next = if down { current + 1 } else { current.saturating_sub(1) };
    self.select(tab, next);
  }

  /// Picks the row at `fallback` when the selected id is gone or unset.
  fn keep_selection(&mut self, tab: DashboardTab, fallback: usize) {
    let present = self.selected[tab.index()]
      .as_ref()
      .is_some_and(|key| self.position_of(tab, key).is_some());
    if !present {
      self.select(tab, fallback);
    }
  }

  pub fn selected_job(&self) -> Option<&JobRow> {
    self.selected[DashboardTab::Jobs.index()].as_ref().and_then(|id| self.jobs.get(id))
  }

  pub fn selected_node(&self) -> Option<&NodeCard> {
    self.selected[DashboardTab::Nodes.index()].as_ref().and_then(|name| self.nodes.get(name))
  }

  pub fn selected_task(&self) -> Option<&TaskRow> {
    self.selected[DashboardTab::Tasks.index()].as_ref().and_then(|id| self.tasks.get(id))
  }

  pub fn apply(&mut self, update: Update) {
    match update {
      Update::Cluster(info) => self.cluster = Some(info),
      Update::Nodes(nodes) => {
        self.nodes.apply(nodes.iter().map(NodeCard::from_node), Placement::Append);
        self.keep_selection(DashboardTab::Nodes, 0);
      }
      Update::Jobs(jobs) => {
        let rows: Vec<_> = jobs
          .iter()
          .filter(|j| !self.deleted_jobs.contains(&j.id))
          .map(JobRow::from_job)
          .collect();
        self.jobs.apply(rows, Placement::Prepend);
        self.keep_selection(DashboardTab::Jobs, 0);
      }
      Update::Tasks { job_id, tasks } => {
        if self.task_context.as_ref().map(|c| c.job_id.as_str()) != Some(job_id.as_str()) {
          return;
        }
        let rows = tasks.iter().enumerate().map(|(i, t)| TaskRow::from_task(i, t));
        self.tasks.apply(rows, Placement::Append);
        self.keep_selection(DashboardTab::Tasks, 0);
      }
      Update::Log { task_id, content } => {
        if let Modal::Log(view) = &mut self.modal {
          if view.task_id == task_id {
            view.content = Some(content);
          }
        }
      }
      Update::ActionDone { action, effect } => {
        if let Effect::RemoveJob(id) = &effect {
          let position = self.selected(DashboardTab::Jobs);
          self.jobs.remove(id);
          self.deleted_jobs.insert(id.clone());
          self.keep_selection(DashboardTab::Jobs, position);
        }
        self.status = Some(format!("Done: {}", action));
      }
      Update::ActionFailed { action, error } => {
        self.status = Some(format!("Unable to {}: {}", action, error));
      }
    }
  }

  pub fn on_key(&mut self, code: KeyCode) -> Option<Command> {
    match &mut self.modal {
      Modal::None => {}
      Modal::Confirm(action) => {
        return match code {
          KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            let action = action.clone();
            self.modal = Modal::None;
            Some(Command::Perform(action))
          }
          KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            self.modal = Modal::None;
            None
          }
          _ => None,
        };
      }
      Modal::Alert(_) => {
        if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
          self.modal = Modal::None;
        }
        return None;
      }
      Modal::Log(view) => {
        match code {
          KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.modal = Modal::None,
          KeyCode::Down => view.scroll = view.scroll.saturating_add(1),
          KeyCode::Up => view.scroll = view.scroll.saturating_sub(1),
          KeyCode::PageDown => view.scroll = view.scroll.saturating_add(20),
          KeyCode::PageUp => view.scroll = view.scroll.saturating_sub(20),
          _ => {}
        }
        return None;
      }
    }

    match (code, self.current_tab) {
      (KeyCode::Char('q'), _) => Some(Command::Quit),
      (KeyCode::Right | KeyCode::Tab, _) => {
        self.next_tab();
        None
      }
      (KeyCode::Left | KeyCode::BackTab, _) => {
        self.previous_tab();
        None
      }
      (KeyCode::Down, _) => {
        self.move_selection(true);
        None
      }
      (KeyCode::Up, _) => {
        self.move_selection(false);
        None
      }
      (KeyCode::Enter, DashboardTab::Jobs) => self.open_selected_job(),
      (KeyCode::Char('c'), DashboardTab::Jobs) => self.confirm_terminate(),
      (KeyCode::Char('d'), DashboardTab::Jobs) => self.confirm_delete(),
      (KeyCode::Enter | KeyCode::Char('t'), DashboardTab::Nodes) => self.toggle_selected_node(),
      (KeyCode::Enter | KeyCode::Char('l'), DashboardTab::Tasks) => self.view_selected_log(),
      _ => None,
    }
  }

  fn open_selected_job(&mut self) -> Option<Command> {
    let job = self.selected_job()?;
    let context = TaskContext { job_id: job.id.clone(), job_name: Some(job.name.clone()) };
    let update = !job.state.is_terminal();
    self.tasks.clear();
    self.selected[DashboardTab::Tasks.index()] = None;
    self.task_context = Some(context.clone());
    self.current_tab = DashboardTab::Tasks;
    Some(Command::OpenTasks { context, update })
  }

  fn confirm_terminate(&mut self) -> Option<Command> {
    let job = self.selected_job()?;
    if !job.cancel_enabled {
      self.status = Some(format!("Job {} has already finished", job.id));
      return None;
    }
    self.modal = Modal::Confirm(Action::TerminateJob(job.id.clone()));
    None
  }

  fn confirm_delete(&mut self) -> Option<Command> {
    let job = self.selected_job()?;
    if !job.delete_enabled {
      self.status = Some(format!("Job {} is still active", job.id));
      return None;
    }
    self.modal = Modal::Confirm(Action::DeleteJob(job.id.clone()));
    None
  }

  fn toggle_selected_node(&mut self) -> Option<Command> {
    let node = self.selected_node()?;
    self.modal = match node.badge.action {
      Some(NodeToggle::Offline) => Modal::Confirm(Action::SetNodeOffline(node.name.clone())),
      Some(NodeToggle::Online) => Modal::Confirm(Action::SetNodeOnline(node.name.clone())),
      None => Modal::Alert(format!("The state of node {} is unknown, it cannot be switched", node.name)),
    };
    None
  }

  fn view_selected_log(&mut self) -> Option<Command> {
    let task = self.selected_task()?;
    let task_id = task.id.clone();
    self.modal = Modal::Log(LogView {
      task_id: task_id.clone(),
      task_name: task.name.clone(),
      content: None,
      scroll: 0,
    });
    Some(Command::LoadLog(task_id))
  }
}
