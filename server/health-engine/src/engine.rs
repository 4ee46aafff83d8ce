//! Run coordinator: window filtering, per-repository routing, two-pass normalization.

use std::collections::HashMap;

use crate::config::{Config, ScoreMode};
use crate::repository::{Normalization, RepositoryAggregator};
use crate::types::*;
use crate::window::Window;

/// Event accounting for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
  /// Consumed by some repository accumulator.
  pub dispatched: u64,
  /// Timestamp outside the window.
  pub out_of_window: u64,
  /// Event kind the engine does not score.
  pub ignored: u64,
}

impl RunStats {
  fn absorb(&mut self, other: RunStats) {
    self.dispatched += other.dispatched;
    self.out_of_window += other.out_of_window;
    self.ignored += other.ignored;
  }
}

/// Owns every repository aggregator for one run.
#[derive(Debug, Clone)]
pub struct RunCoordinator {
  window: Window,
  score_mode: ScoreMode,
  repos: HashMap<u64, RepositoryAggregator>,
  stats: RunStats,
}

impl RunCoordinator {
  pub fn new(window: Window, config: &Config) -> Self {
    Self {
      window,
      score_mode: config.score_mode,
      repos: HashMap::new(),
      stats: RunStats::default(),
    }
  }

  pub fn with_defaults(window: Window) -> Self {
    Self::new(window, &Config::default())
  }

  pub fn stats(&self) -> RunStats {
    self.stats
  }

  pub fn repository_count(&self) -> usize {
    self.repos.len()
  }

  pub fn repository(&self, id: u64) -> Option<&RepositoryAggregator> {
    self.repos.get(&id)
  }

  /// Route one parsed event. Out-of-window and ignored events never reach an aggregator.
  pub fn dispatch(&mut self, event: &Event, payload: &Payload) {
    if !self.window.contains(event.timestamp) {
      self.stats.out_of_window += 1;
      return;
    }
    if event.kind == EventKind::Ignored {
      self.stats.ignored += 1;
      return;
    }

    let window = self.window;
    let repo = self
      .repos
      .entry(event.repo.id)
      .or_insert_with(|| RepositoryAggregator::new(event.repo.clone(), window));

    if repo.consume(event, payload) {
      self.stats.dispatched += 1;
    } else {
      self.stats.ignored += 1;
    }
  }

  /// Union with a coordinator over the same window. Repository ids must be disjoint,
  /// which shard partitioning by id guarantees.
  pub(crate) fn merge(&mut self, other: RunCoordinator) {
    self.stats.absorb(other.stats);
    for (id, repo) in other.repos {
      debug_assert!(!self.repos.contains_key(&id), "repository {id} present in both shards");
      self.repos.insert(id, repo);
    }
  }

  /// Pass 1: run-wide extrema over every repository.
  pub fn normalization(&self) -> Normalization {
    let mut norm = Normalization::default();
    for repo in self.repos.values() {
      norm.observe(repo);
    }
    norm
  }

  /// Two-pass scoring. Sorted by score descending; ties by ascending repository id.
  pub fn finalize(&self) -> Vec<RepositoryScore> {
    let norm = self.normalization();

    let mut scores: Vec<RepositoryScore> = self
      .repos
      .values()
      .map(|repo| RepositoryScore {
        repository_id: repo.key().id,
        organization: repo.key().organization.clone(),
        repository: repo.key().name.clone(),
        score: repo.compute_score(&norm, self.score_mode),
        commit_count: repo.commit_volume().commits(),
      })
      .collect();

    scores.sort_by(|a, b| {
      b.score
        .total_cmp(&a.score)
        .then_with(|| a.repository_id.cmp(&b.repository_id))
    });
    scores
  }
}
