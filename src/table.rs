use std::collections::HashMap;
use std::hash::Hash;

/// A rendered row: something with a stable identity that may reach a final state.
pub trait Row {
  type Key: Clone + Eq + Hash;

  fn key(&self) -> Self::Key;

  /// Rows in a terminal state are never rewritten by later polls.
  fn is_terminal(&self) -> bool {
    false
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
  Prepend,
  Append,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
  pub created: usize,
  pub updated: usize,
  pub frozen: usize,
}

/// Rows in display order, addressed by id.
#[derive(Debug, Clone)]
pub struct RowTable<R: Row> {
  rows: Vec<R>,
  index: HashMap<R::Key, usize>,
}

impl<R: Row> Default for RowTable<R> {
  fn default() -> Self {
    Self { rows: Vec::new(), index: HashMap::new() }
  }
}

impl<R: Row> RowTable<R> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn rows(&self) -> &[R] {
    &self.rows
  }

  pub fn get(&self, key: &R::Key) -> Option<&R> {
    self.index.get(key).map(|&i| &self.rows[i])
  }

  pub fn contains(&self, key: &R::Key) -> bool {
    self.index.contains_key(key)
  }

  /// Display position of `key`.
  pub fn position(&self, key: &R::Key) -> Option<usize> {
    self.index.get(key).copied()
  }

  /// Merges one poll worth of rows. New ids are placed per `placement`, in
  /// the order they were polled; known ids are replaced in place unless
  /// their current row is terminal.
  pub fn apply<I>(&mut self, polled: I, placement: Placement) -> ApplyReport
  where
    I: IntoIterator<Item = R>,
  {
    let mut report = ApplyReport::default();
    let mut fresh = Vec::new();
    for row in polled {
      let key = row.key();
      match self.index.get(&key) {
        Some(&i) if self.rows[i].is_terminal() => report.frozen += 1,
        Some(&i) => {
          self.rows[i] = row;
          report.updated += 1;
        }
        None if fresh.iter().any(|r: &R| r.key() == key) => {}
        None => {
          fresh.push(row);
          report.created += 1;
        }
      }
    }
    if !fresh.is_empty() {
      match placement {
        Placement::Append => self.rows.extend(fresh),
        Placement::Prepend => {
          // each new job lands on top, so the last one polled ends up first
          fresh.reverse();
          fresh.append(&mut self.rows);
          self.rows = fresh;
        }
      }
      self.reindex();
    }
    report
  }

  pub fn remove(&mut self, key: &R::Key) -> Option<R> {
    let i = self.index.remove(key)?;
    let row = self.rows.remove(i);
    self.reindex();
    Some(row)
  }

  pub fn clear(&mut self) {
    self.rows.clear();
    self.index.clear();
  }

  fn reindex(&mut self) {
    self.index = self.rows.iter().enumerate().map(|(i, r)| (r.key(), i)).collect();
  }
}
