use tui::{
  Frame,
  backend::Backend,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Span, Spans, Text},
  widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::app::{App, DashboardTab, LogView, Modal};
use crate::models::NodeState;
use crate::views::{BarStyle, ErrorCell, PLACEHOLDER};

const BAR_WIDTH: usize = 10;
const MAX_GPU_ICONS: u32 = 16;

pub fn ui<B: Backend>(f: &mut Frame<B>, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .margin(1)
    .constraints([
      Constraint::Length(3),
      Constraint::Min(0),
      Constraint::Length(3),
    ].as_ref())
    .split(f.size());

  let title = match &app.cluster {
    Some(cluster) => format!("LightSched cluster {}", cluster.id),
    None => "LightSched".to_string(),
  };
  let tabs = Tabs::new(
    DashboardTab::TITLES
      .iter()
      .map(|t| Spans::from(Span::styled(*t, Style::default().fg(Color::Yellow))))
      .collect(),
  )
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .select(app.current_tab.index());
  f.render_widget(tabs, chunks[0]);

  match app.current_tab {
    DashboardTab::Nodes => render_nodes(f, app, chunks[1]),
    DashboardTab::Jobs => render_jobs(f, app, chunks[1]),
    DashboardTab::Tasks => render_tasks(f, app, chunks[1]),
  }

  let keys = match app.current_tab {
    DashboardTab::Nodes => "Enter/t: Toggle Online",
    DashboardTab::Jobs => "Enter: Tasks | c: Cancel | d: Delete",
    DashboardTab::Tasks => "Enter/l: View Log",
  };
  let mut footer = vec![Span::raw(format!("←/→: Switch Tabs | ↑/↓: Select | {} | q: Quit", keys))];
  if let Some(status) = &app.status {
    footer.push(Span::raw("  "));
    footer.push(Span::styled(status.clone(), Style::default().fg(Color::Magenta)));
  }
  let footer = Paragraph::new(Spans::from(footer))
    .style(Style::default().fg(Color::White))
    .block(Block::default().borders(Borders::ALL));
  f.render_widget(footer, chunks[2]);

  match &app.modal {
    Modal::None => {}
    Modal::Confirm(action) => render_dialog(f, "Confirm", &format!("{}\n\ny: Yes   n: No", action.prompt())),
    Modal::Alert(message) => render_dialog(f, "Notice", &format!("{}\n\nEnter: Close", message)),
    Modal::Log(view) => render_log(f, view),
  }
}

pub fn bar_color(style: BarStyle) -> Color {
  match style {
    BarStyle::Info => Color::Cyan,
    BarStyle::Active => Color::Blue,
    BarStyle::Warning => Color::Yellow,
    BarStyle::Success => Color::Green,
    BarStyle::Danger => Color::Red,
  }
}

fn node_color(state: NodeState) -> Color {
  match state {
    NodeState::Online => Color::Green,
    NodeState::Offline => Color::Yellow,
    NodeState::Unknown => Color::DarkGray,
  }
}

/// Text progress bar, e.g. `█████░░░░░  50%`.
pub fn progress_bar(progress: u8) -> String {
  let progress = progress.min(100) as usize;
  let filled = progress * BAR_WIDTH / 100;
  format!("{}{} {:>3}%", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled), progress)
}

/// One icon per card, at most `MAX_GPU_ICONS`, then a count of the rest.
pub fn gpu_icons(cards: u32) -> String {
  if cards == 0 {
    return "none".to_string();
  }
  let shown = cards.min(MAX_GPU_ICONS);
  let icons = "▣ ".repeat(shown as usize);
  if cards > shown {
    format!("{}+{}", icons, cards - shown)
  } else {
    icons
  }
}

fn or_placeholder(value: &Option<String>) -> String {
  value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn render_nodes<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
  let items: Vec<ListItem> = app.nodes.rows().iter().map(|n| {
    let gpus = gpu_icons(n.gpus);
    let lines = vec![
      Spans::from(vec![
        Span::styled(n.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(n.badge.title, Style::default().fg(node_color(n.state))),
      ]),
      Spans::from(Span::raw(format!("Platform: {}", n.platform))),
      Spans::from(Span::raw(format!("CPU: {} | Memory: {} | GPUs: {}", n.cpu, n.memory, gpus))),
    ];
    ListItem::new(lines)
  }).collect();

  let title = format!("Compute Nodes ({})", app.nodes.len());
  let list = List::new(items)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::Blue));
  let mut state = ListState::default();
  if !app.nodes.is_empty() {
    state.select(Some(app.selected(DashboardTab::Nodes)));
  }
  f.render_stateful_widget(list, area, &mut state);
}

fn render_jobs<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
  let header = Row::new(["ID", "Name", "State", "Tasks", "Progress", "Started", "Finished", "Actions"])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
  let rows: Vec<Row> = app.jobs.rows().iter().map(|j| {
    let mut actions = Vec::new();
    if j.cancel_enabled {
      actions.push("[c]ancel");
    }
    if j.delete_enabled {
      actions.push("[d]elete");
    }
    Row::new(vec![
      Cell::from(j.id.clone()),
      Cell::from(j.name.clone()),
      Cell::from(j.badge.label),
      Cell::from(j.tasks.to_string()),
      Cell::from(Span::styled(progress_bar(j.progress), Style::default().fg(bar_color(j.bar)))),
      Cell::from(or_placeholder(&j.exec_time)),
      Cell::from(or_placeholder(&j.finish_time)),
      Cell::from(actions.join(" ")),
    ])
  }).collect();

  let table = Table::new(rows)
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!("Jobs ({})", app.jobs.len())))
    .highlight_style(Style::default().bg(Color::Blue))
    .widths(&[
      Constraint::Length(14),
      Constraint::Min(12),
      Constraint::Length(10),
      Constraint::Length(6),
      Constraint::Length(16),
      Constraint::Length(19),
      Constraint::Length(19),
      Constraint::Length(17),
    ]);
  let mut state = TableState::default();
  if !app.jobs.is_empty() {
    state.select(Some(app.selected(DashboardTab::Jobs)));
  }
  f.render_stateful_widget(table, area, &mut state);
}

fn render_tasks<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
  let Some(context) = &app.task_context else {
    let hint = Paragraph::new("Select a job on the Jobs tab and press Enter to list its tasks.")
      .block(Block::default().borders(Borders::ALL).title("Tasks"));
    f.render_widget(hint, area);
    return;
  };

  let header = Row::new(["#", "Name", "State", "Node", "Progress", "Started", "Finished", "Error"])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
  let rows: Vec<Row> = app.tasks.rows().iter().map(|t| {
    let error = match &t.error {
      ErrorCell::Alert { message } => Cell::from(Span::styled(format!("⚠ {}", message), Style::default().fg(Color::Red))),
      ErrorCell::None => Cell::from(PLACEHOLDER),
    };
    Row::new(vec![
      Cell::from(t.index.to_string()),
      Cell::from(t.name.clone()),
      Cell::from(t.badge.label),
      Cell::from(t.node.clone()),
      Cell::from(Span::styled(progress_bar(t.progress), Style::default().fg(bar_color(t.bar)))),
      Cell::from(or_placeholder(&t.start_time)),
      Cell::from(or_placeholder(&t.finish_time)),
      error,
    ])
  }).collect();

  let title = format!("Tasks of job {} ({})", context.title(), app.tasks.len());
  let table = Table::new(rows)
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::Blue))
    .widths(&[
      Constraint::Length(4),
      Constraint::Min(12),
      Constraint::Length(11),
      Constraint::Length(14),
      Constraint::Length(16),
      Constraint::Length(19),
      Constraint::Length(19),
      Constraint::Min(10),
    ]);
  let mut state = TableState::default();
  if !app.tasks.is_empty() {
    state.select(Some(app.selected(DashboardTab::Tasks)));
  }
  f.render_stateful_widget(table, area, &mut state);
}

fn render_dialog<B: Backend>(f: &mut Frame<B>, title: &str, text: &str) {
  let area = centered_rect(50, 25, f.size());
  let dialog = Paragraph::new(text.to_string())
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
  f.render_widget(Clear, area);
  f.render_widget(dialog, area);
}

fn render_log<B: Backend>(f: &mut Frame<B>, view: &LogView) {
  let area = centered_rect(85, 80, f.size());
  let (text, style) = match &view.content {
    None => (Text::raw("Loading..."), Style::default().fg(Color::DarkGray)),
    Some(Ok(log)) if log.is_empty() => (Text::raw("(empty log)"), Style::default().fg(Color::DarkGray)),
    Some(Ok(log)) => (Text::raw(log.as_str()), Style::default()),
    Some(Err(e)) => (Text::raw(format!("Unable to load log: {}", e)), Style::default().fg(Color::Red)),
  };
  let title = format!("Log of task {} ({}) | ↑/↓: Scroll | Esc: Close", view.task_name, view.task_id);
  let log = Paragraph::new(text)
    .style(style)
    .wrap(Wrap { trim: false })
    .scroll((view.scroll, 0))
    .block(Block::default().borders(Borders::ALL).title(title));
  f.render_widget(Clear, area);
  f.render_widget(log, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
  let vertical = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage((100 - percent_y) / 2),
      Constraint::Percentage(percent_y),
      Constraint::Percentage((100 - percent_y) / 2),
    ].as_ref())
    .split(r);
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage((100 - percent_x) / 2),
      Constraint::Percentage(percent_x),
      Constraint::Percentage((100 - percent_x) / 2),
    ].as_ref())
    .split(vertical[1])[1]
}
