//! Per-repository sub-metric accumulators and their normalized raw scores.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::trackers::{IssueOpenTracker, PullRequestMergeTracker};
use crate::types::{IssueAction, PullRequestAction};
use crate::window::Window;

/// Lower-is-better average against the run-wide minimum. An average of 0 scores 1.
fn inverse_ratio_score(average: f64, min_average: f64) -> f64 {
  if average == 0.0 {
    1.0
  } else {
    min_average / average
  }
}

// ---------------------------------------------------------------------------
// Commit volume
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CommitVolume {
  commits: u64,
}

impl CommitVolume {
  pub fn consume(&mut self, distinct_commits: u64) {
    self.commits += distinct_commits;
  }

  pub fn commits(&self) -> u64 {
    self.commits
  }

  pub fn raw_score(&self, max_commits: u64) -> f64 {
    if max_commits == 0 {
      return 0.0;
    }
    self.commits as f64 / max_commits as f64
  }
}

// ---------------------------------------------------------------------------
// Commits per developer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CommitsPerDeveloper {
  commits: u64,
  developers: HashSet<u64>,
}

impl CommitsPerDeveloper {
  pub fn consume(&mut self, actor_id: u64, distinct_commits: u64) {
    self.commits += distinct_commits;
    self.developers.insert(actor_id);
  }

  pub fn developer_count(&self) -> usize {
    self.developers.len()
  }

  /// 0 until a push has been seen.
  pub fn commits_per_developer(&self) -> f64 {
    if self.developers.is_empty() {
      return 0.0;
    }
    self.commits as f64 / self.developers.len() as f64
  }

  /// `commits / (developers * max)`: carries an extra `1 / developers` factor over
  /// `commits_per_developer / max`. Kept as-is so scores stay comparable with earlier runs.
  pub fn raw_score(&self, max_commits_per_developer: f64) -> f64 {
    if max_commits_per_developer == 0.0 || self.developers.is_empty() {
      return 0.0;
    }
    self.commits as f64 / (self.developers.len() as f64 * max_commits_per_developer)
  }
}

// ---------------------------------------------------------------------------
// Issue open time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IssueOpenTime {
  window: Window,
  issues: HashMap<u64, IssueOpenTracker>,
}

impl IssueOpenTime {
  pub fn new(window: Window) -> Self {
    Self {
      window,
      issues: HashMap::new(),
    }
  }

  pub fn consume(&mut self, issue_id: u64, action: IssueAction, at: DateTime<Utc>) {
    let window_start = self.window.start();
    self
      .issues
      .entry(issue_id)
      .or_insert_with(|| IssueOpenTracker::new(window_start))
      .consume(action, at);
  }

  pub fn issue_count(&self) -> usize {
    self.issues.len()
  }

  /// Mean open seconds per issue; the full window length when no issue was seen.
  pub fn average_open_time(&self) -> f64 {
    if self.issues.is_empty() {
      return self.window.length_seconds() as f64;
    }
    let end = self.window.end();
    let total: i64 = self.issues.values().map(|t| t.open_duration(end)).sum();
    total as f64 / self.issues.len() as f64
  }

  pub fn raw_score(&self, min_average_open_time: f64) -> f64 {
    inverse_ratio_score(self.average_open_time(), min_average_open_time)
  }
}

// ---------------------------------------------------------------------------
// Pull-request merge time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PullRequestMergeTime {
  window: Window,
  pull_requests: HashMap<u64, PullRequestMergeTracker>,
}

impl PullRequestMergeTime {
  pub fn new(window: Window) -> Self {
    Self {
      window,
      pull_requests: HashMap::new(),
    }
  }

  pub fn consume(&mut self, pull_request_id: u64, action: PullRequestAction, merged: bool, at: DateTime<Utc>) {
    self
      .pull_requests
      .entry(pull_request_id)
      .or_default()
      .consume(action, merged, at);
  }

  pub fn pull_request_count(&self) -> usize {
    self.pull_requests.len()
  }

  /// Mean merge seconds over merged pull requests only; unmerged ones are excluded,
  /// not counted as zero. The full window length when nothing merged.
  pub fn average_merge_time(&self) -> f64 {
    let (total, merged) = self
      .pull_requests
      .values()
      .filter_map(PullRequestMergeTracker::merge_seconds)
      .fold((0i64, 0usize), |(total, n), secs| (total + secs, n + 1));
    if merged == 0 {
      return self.window.length_seconds() as f64;
    }
    total as f64 / merged as f64
  }

  pub fn raw_score(&self, min_average_merge_time: f64) -> f64 {
    inverse_ratio_score(self.average_merge_time(), min_average_merge_time)
  }
}
