use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info};

use crate::error::Result;

/// Forces an extra poll on a running loop. Does nothing once the loop stopped.
#[derive(Debug, Clone)]
pub struct Refresher(Arc<Notify>);

impl Refresher {
  pub fn refresh(&self) {
    self.0.notify_one();
  }
}

/// A running poll loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct PollHandle {
  name: &'static str,
  refresh: Arc<Notify>,
  task: JoinHandle<()>,
}

impl PollHandle {
  /// Polls `fetch` every `interval`, first tick immediately, handing each
  /// successful result to `sink`. Failed polls are dropped.
  pub fn spawn<T, F, Fut, S>(name: &'static str, interval: Duration, fetch: F, sink: S) -> Self
  where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    S: Fn(T) + Send + 'static,
  {
    let refresh = Arc::new(Notify::new());
    let wake = refresh.clone();
    let task = tokio::spawn(async move {
      let mut timer = tokio::time::interval(interval);
      timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
      let mut ticks = IntervalStream::new(timer);
      info!("Polling {} every {:?}", name, interval);
      loop {
        tokio::select! {
          tick = ticks.next() => {
            if tick.is_none() {
              break;
            }
          }
          _ = wake.notified() => {
            debug!("Refreshing {}", name);
          }
        }
        match fetch().await {
          Ok(items) => sink(items),
          Err(e) => debug!("Polling {} failed: {}", name, e),
        }
      }
    });
    Self { name, refresh, task }
  }

  /// Fetches once and never again.
  pub fn once<T, Fut, S>(name: &'static str, fetch: Fut, sink: S) -> Self
  where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    S: FnOnce(T) + Send + 'static,
  {
    let task = tokio::spawn(async move {
      match fetch.await {
        Ok(items) => sink(items),
        Err(e) => debug!("Loading {} failed: {}", name, e),
      }
    });
    Self { name, refresh: Arc::new(Notify::new()), task }
  }

  /// Triggers one extra poll right away.
  pub fn refresh(&self) {
    self.refresh.notify_one();
  }

  pub fn refresher(&self) -> Refresher {
    Refresher(self.refresh.clone())
  }

  pub fn is_running(&self) -> bool {
    !self.task.is_finished()
  }

  pub fn stop(self) {
    drop(self);
  }
}

impl Drop for PollHandle {
  fn drop(&mut self) {
    debug!("Stopping {} poller", self.name);
    self.task.abort();
  }
}
