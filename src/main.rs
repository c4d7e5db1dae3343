use std::{
  fs::OpenOptions,
  io,
  sync::Mutex,
  time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
  event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::{
  Terminal,
  backend::{Backend, CrosstermBackend},
};

use lightsched_console::{
  api::ApiClient,
  app::{App, Command, TaskContext, Update},
  config::{Config, OutputFormat},
  console::{Console, Intervals},
  snapshot,
  ui::ui,
};

fn init_tracing(config: &Config) -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  match &config.log_file {
    Some(path) => {
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Unable to open log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    // the console owns the terminal, so it only logs when given a file
    None if !config.once => {}
    None => tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init(),
  }
  Ok(())
}

fn main() -> Result<()> {
  let config = Config::parse();
  init_tracing(&config)?;

  let rt = Runtime::new()?;
  let api = ApiClient::new(config.server.clone(), config.request_timeout())?;

  if config.once {
    let snapshot = rt
      .block_on(snapshot::fetch(&api, config.jobid.as_deref()))
      .with_context(|| format!("Unable to query {}", api.base()))?;
    match config.format {
      OutputFormat::Text => print!("{}", snapshot.to_text()),
      OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    return Ok(());
  }

  let cluster = rt
    .block_on(api.connect(config.connect_retries))
    .with_context(|| format!("Unable to reach the API server at {}", api.base()))?;

  enable_raw_mode()?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend)?;

  let result = run(&mut terminal, &rt, api, &config, Update::Cluster(cluster));

  disable_raw_mode()?;
  execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
  terminal.show_cursor()?;
  result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, rt: &Runtime, api: ApiClient, config: &Config, first: Update) -> Result<()> {
  let _guard = rt.enter();
  let (tx, mut rx) = unbounded_channel();
  let intervals = Intervals {
    nodes: config.node_interval(),
    jobs: config.job_interval(),
    tasks: config.task_interval(),
  };
  let mut console = Console::new(api, tx, intervals);
  console.start_nodes();
  console.start_jobs();

  let context = config.jobid.clone().map(|job_id| TaskContext { job_id, job_name: config.jobname.clone() });
  if let Some(context) = &context {
    console.open_tasks(context, config.update);
  }
  let mut app = App::new(context);
  app.apply(first);

  let tick_rate = Duration::from_millis(250);
  let mut last_tick = Instant::now();

  loop {
    while let Ok(update) = rx.try_recv() {
      app.apply(update);
    }
    terminal.draw(|f| ui(f, &app))?;

    let timeout = tick_rate
      .checked_sub(last_tick.elapsed())
      .unwrap_or_else(|| Duration::from_secs(0));
    if event::poll(timeout)? {
      if let CEvent::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
          match app.on_key(key.code) {
            Some(Command::Quit) => break,
            Some(Command::OpenTasks { context, update }) => console.open_tasks(&context, update),
            Some(Command::Perform(action)) => {
              console.dispatch(action);
            }
            Some(Command::LoadLog(task_id)) => console.load_log(task_id),
            None => {}
          }
        }
      }
    }
    if last_tick.elapsed() >= tick_rate {
      last_tick = Instant::now();
    }
  }

  console.stop();
  info!("Console closed");
  Ok(())
}
