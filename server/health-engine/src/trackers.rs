//! Per-entity state machines: issue open time and pull-request merge time.

use chrono::{DateTime, Utc};

use crate::types::{IssueAction, PullRequestAction};

const LOG_TARGET: &str = "health_engine::trackers";

/// Whole seconds from `start` to `end`, clamped to zero.
///
/// Archive files are not ordered, so a close can arrive before its open.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
  let secs = (end - start).num_seconds();
  if secs < 0 {
    log::debug!(
      target: LOG_TARGET,
      "Out-of-order interval {} -> {} ({}s), clamping to zero",
      start.to_rfc3339(),
      end.to_rfc3339(),
      secs
    );
    return 0;
  }
  secs
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Open-time bookkeeping for one issue.
///
/// An issue never seen opening is treated as open since the window start.
#[derive(Debug, Clone)]
pub struct IssueOpenTracker {
  last_opened_at: DateTime<Utc>,
  accumulated_open_seconds: i64,
  is_closed: bool,
}

impl IssueOpenTracker {
  pub fn new(window_start: DateTime<Utc>) -> Self {
    Self {
      last_opened_at: window_start,
      accumulated_open_seconds: 0,
      is_closed: false,
    }
  }

  /// Every (re)open restarts the interval; every close charges the interval since the last open.
  pub fn consume(&mut self, action: IssueAction, at: DateTime<Utc>) {
    match action {
      IssueAction::Opened | IssueAction::Reopened => {
        self.last_opened_at = at;
        self.is_closed = false;
      }
      IssueAction::Closed => {
        self.accumulated_open_seconds += elapsed_seconds(self.last_opened_at, at);
        self.is_closed = true;
      }
      IssueAction::Ignored => {}
    }
  }

  /// Accumulated open time, plus the still-open remainder up to `window_end`.
  /// Pure read: stored state is untouched.
  pub fn open_duration(&self, window_end: DateTime<Utc>) -> i64 {
    if self.is_closed {
      self.accumulated_open_seconds
    } else {
      self.accumulated_open_seconds + elapsed_seconds(self.last_opened_at, window_end)
    }
  }

  pub fn is_closed(&self) -> bool {
    self.is_closed
  }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeState {
  Unseen,
  Open { opened_at: DateTime<Utc> },
  Merged { seconds: i64 },
  /// Closed unmerged, or closed without an observed open. Terminal.
  Abandoned,
}

/// Merge-time bookkeeping for one pull request.
///
/// Only Opened -> Closed(merged) yields a merge time, and only once.
#[derive(Debug, Clone)]
pub struct PullRequestMergeTracker {
  state: MergeState,
}

impl Default for PullRequestMergeTracker {
  fn default() -> Self {
    Self::new()
  }
}

impl PullRequestMergeTracker {
  pub fn new() -> Self {
    Self {
      state: MergeState::Unseen,
    }
  }

  pub fn consume(&mut self, action: PullRequestAction, merged: bool, at: DateTime<Utc>) {
    self.state = match (self.state, action) {
      (MergeState::Unseen | MergeState::Open { .. }, PullRequestAction::Opened) => {
        MergeState::Open { opened_at: at }
      }
      (MergeState::Open { opened_at }, PullRequestAction::Closed) if merged => MergeState::Merged {
        seconds: elapsed_seconds(opened_at, at),
      },
      (MergeState::Unseen | MergeState::Open { .. }, PullRequestAction::Closed) => MergeState::Abandoned,
      (state, _) => state,
    };
  }

  pub fn opened_at(&self) -> Option<DateTime<Utc>> {
    match self.state {
      MergeState::Open { opened_at } => Some(opened_at),
      _ => None,
    }
  }

  pub fn merge_seconds(&self) -> Option<i64> {
    match self.state {
      MergeState::Merged { seconds } => Some(seconds),
      _ => None,
    }
  }

  pub fn has_valid_merge_time(&self) -> bool {
    self.merge_seconds().is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 8, 1, 0, 0, 0).unwrap()
  }

  fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
  }

  #[test]
  fn issue_open_then_closed() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Opened, at(100));
    tracker.consume(IssueAction::Closed, at(3_700));
    assert!(tracker.is_closed());
    assert_eq!(tracker.open_duration(at(10_000)), 3_600);
  }

  #[test]
  fn issue_never_seen_opening_counts_from_window_start() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Closed, at(500));
    assert_eq!(tracker.open_duration(at(10_000)), 500);
  }

  #[test]
  fn issue_still_open_charged_to_window_end() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Opened, at(1_000));
    assert_eq!(tracker.open_duration(at(4_000)), 3_000);
  }

  #[test]
  fn open_duration_read_is_idempotent() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Opened, at(10));
    tracker.consume(IssueAction::Closed, at(20));
    tracker.consume(IssueAction::Reopened, at(30));
    let first = tracker.open_duration(at(100));
    let second = tracker.open_duration(at(100));
    assert_eq!(first, second);
    assert_eq!(first, 10 + 70);
  }

  #[test]
  fn reopen_resets_interval_start() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Opened, at(0));
    tracker.consume(IssueAction::Reopened, at(50));
    tracker.consume(IssueAction::Closed, at(80));
    assert_eq!(tracker.open_duration(at(1_000)), 30);
  }

  #[test]
  fn ignored_issue_action_leaves_state_alone() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Ignored, at(50));
    assert!(!tracker.is_closed());
    assert_eq!(tracker.open_duration(at(100)), 100);
  }

  #[test]
  fn out_of_order_close_is_clamped() {
    let mut tracker = IssueOpenTracker::new(t0());
    tracker.consume(IssueAction::Opened, at(500));
    tracker.consume(IssueAction::Closed, at(100));
    assert_eq!(tracker.open_duration(at(1_000)), 0);
  }

  #[test]
  fn pull_request_opened_then_merged() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Opened, false, at(0));
    assert_eq!(tracker.opened_at(), Some(at(0)));
    tracker.consume(PullRequestAction::Closed, true, at(1_800));
    assert!(tracker.has_valid_merge_time());
    assert_eq!(tracker.merge_seconds(), Some(1_800));
  }

  #[test]
  fn pull_request_first_merge_wins() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Opened, false, at(0));
    tracker.consume(PullRequestAction::Closed, true, at(60));
    tracker.consume(PullRequestAction::Opened, false, at(100));
    tracker.consume(PullRequestAction::Closed, true, at(900));
    assert_eq!(tracker.merge_seconds(), Some(60));
  }

  #[test]
  fn pull_request_only_opened_has_no_merge_time() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Opened, false, at(0));
    assert!(!tracker.has_valid_merge_time());
    assert_eq!(tracker.merge_seconds(), None);
  }

  #[test]
  fn pull_request_closed_unmerged_is_terminal() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Opened, false, at(0));
    tracker.consume(PullRequestAction::Closed, false, at(10));
    tracker.consume(PullRequestAction::Opened, false, at(20));
    tracker.consume(PullRequestAction::Closed, true, at(30));
    assert!(!tracker.has_valid_merge_time());
  }

  #[test]
  fn pull_request_closed_without_open_is_terminal() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Closed, true, at(10));
    tracker.consume(PullRequestAction::Opened, false, at(20));
    tracker.consume(PullRequestAction::Closed, true, at(30));
    assert!(!tracker.has_valid_merge_time());
  }

  #[test]
  fn pull_request_ignored_action_keeps_open_state() {
    let mut tracker = PullRequestMergeTracker::new();
    tracker.consume(PullRequestAction::Opened, false, at(0));
    tracker.consume(PullRequestAction::Ignored, false, at(5));
    tracker.consume(PullRequestAction::Closed, true, at(45));
    assert_eq!(tracker.merge_seconds(), Some(45));
  }
}
