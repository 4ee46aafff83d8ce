//! One repository's sub-metrics and its combined health score.

use crate::config::ScoreMode;
use crate::metrics::{CommitVolume, CommitsPerDeveloper, IssueOpenTime, PullRequestMergeTime};
use crate::types::{Event, EventKind, Payload, RepositoryKey};
use crate::window::Window;

/// Run-wide extrema every repository is normalized against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
  pub max_commits: u64,
  pub max_commits_per_developer: f64,
  pub min_average_issue_open_time: f64,
  pub min_average_merge_time: f64,
}

impl Default for Normalization {
  fn default() -> Self {
    Self {
      max_commits: 0,
      max_commits_per_developer: 0.0,
      min_average_issue_open_time: f64::INFINITY,
      min_average_merge_time: f64::INFINITY,
    }
  }
}

impl Normalization {
  /// Fold one repository's raw sub-metrics into the extrema.
  pub fn observe(&mut self, repo: &RepositoryAggregator) {
    self.max_commits = self.max_commits.max(repo.commit_volume.commits());
    self.max_commits_per_developer = self
      .max_commits_per_developer
      .max(repo.commits_per_developer.commits_per_developer());
    self.min_average_issue_open_time = self
      .min_average_issue_open_time
      .min(repo.issue_open_time.average_open_time());
    self.min_average_merge_time = self
      .min_average_merge_time
      .min(repo.merge_time.average_merge_time());
  }
}

/// Owns the four accumulators for one repository.
#[derive(Debug, Clone)]
pub struct RepositoryAggregator {
  key: RepositoryKey,
  commit_volume: CommitVolume,
  commits_per_developer: CommitsPerDeveloper,
  issue_open_time: IssueOpenTime,
  merge_time: PullRequestMergeTime,
}

impl RepositoryAggregator {
  pub fn new(key: RepositoryKey, window: Window) -> Self {
    Self {
      key,
      commit_volume: CommitVolume::default(),
      commits_per_developer: CommitsPerDeveloper::default(),
      issue_open_time: IssueOpenTime::new(window),
      merge_time: PullRequestMergeTime::new(window),
    }
  }

  /// Route an event to the accumulators for its kind. Returns false when nothing consumed it.
  pub fn consume(&mut self, event: &Event, payload: &Payload) -> bool {
    match (event.kind, payload) {
      (EventKind::Push, Payload::Push { distinct_commits }) => {
        self.commit_volume.consume(*distinct_commits);
        self.commits_per_developer.consume(event.actor_id, *distinct_commits);
        true
      }
      (EventKind::Issues, Payload::Issues { action, issue_id }) => {
        self.issue_open_time.consume(*issue_id, *action, event.timestamp);
        true
      }
      (
        EventKind::PullRequest,
        Payload::PullRequest {
          action,
          pull_request_id,
          merged,
        },
      ) => {
        self
          .merge_time
          .consume(*pull_request_id, *action, *merged, event.timestamp);
        true
      }
      _ => false,
    }
  }

  pub fn key(&self) -> &RepositoryKey {
    &self.key
  }

  pub fn commit_volume(&self) -> &CommitVolume {
    &self.commit_volume
  }

  pub fn commits_per_developer(&self) -> &CommitsPerDeveloper {
    &self.commits_per_developer
  }

  pub fn issue_open_time(&self) -> &IssueOpenTime {
    &self.issue_open_time
  }

  pub fn merge_time(&self) -> &PullRequestMergeTime {
    &self.merge_time
  }

  /// Sum of the raw scores. `LegacyThreeTerms` leaves the merge-time term out.
  pub fn compute_score(&self, norm: &Normalization, mode: ScoreMode) -> f64 {
    let score = self.commit_volume.raw_score(norm.max_commits)
      + self
        .commits_per_developer
        .raw_score(norm.max_commits_per_developer)
      + self
        .issue_open_time
        .raw_score(norm.min_average_issue_open_time);

    match mode {
      ScoreMode::AllTerms => score + self.merge_time.raw_score(norm.min_average_merge_time),
      ScoreMode::LegacyThreeTerms => score,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{IssueAction, PullRequestAction};
  use chrono::{DateTime, Duration, TimeZone, Utc};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 8, 1, 0, 0, 0).unwrap()
  }

  fn event(kind: EventKind, actor_id: u64, secs: i64) -> Event {
    Event {
      id: 1,
      kind,
      repo: key(),
      actor_id,
      timestamp: t0() + Duration::seconds(secs),
    }
  }

  fn key() -> RepositoryKey {
    RepositoryKey {
      id: 42,
      organization: "acme".into(),
      name: "widgets".into(),
    }
  }

  fn aggregator() -> RepositoryAggregator {
    let window = Window::new(t0(), t0() + Duration::seconds(3_600)).unwrap();
    RepositoryAggregator::new(key(), window)
  }

  #[test]
  fn push_feeds_both_commit_metrics() {
    let mut repo = aggregator();
    assert!(repo.consume(&event(EventKind::Push, 7, 0), &Payload::Push { distinct_commits: 5 }));
    assert_eq!(repo.commit_volume().commits(), 5);
    assert_eq!(repo.commits_per_developer().developer_count(), 1);
    assert_eq!(repo.issue_open_time().issue_count(), 0);
  }

  #[test]
  fn mismatched_kind_and_payload_is_not_consumed() {
    let mut repo = aggregator();
    assert!(!repo.consume(&event(EventKind::Issues, 7, 0), &Payload::Push { distinct_commits: 5 }));
    assert!(!repo.consume(&event(EventKind::Ignored, 7, 0), &Payload::Ignored));
    assert_eq!(repo.commit_volume().commits(), 0);
  }

  fn busy_repo() -> RepositoryAggregator {
    let mut repo = aggregator();
    repo.consume(&event(EventKind::Push, 7, 0), &Payload::Push { distinct_commits: 10 });
    repo.consume(
      &event(EventKind::Issues, 7, 0),
      &Payload::Issues {
        action: IssueAction::Opened,
        issue_id: 1,
      },
    );
    repo.consume(
      &event(EventKind::Issues, 7, 1_200),
      &Payload::Issues {
        action: IssueAction::Closed,
        issue_id: 1,
      },
    );
    repo.consume(
      &event(EventKind::PullRequest, 7, 0),
      &Payload::PullRequest {
        action: PullRequestAction::Opened,
        pull_request_id: 9,
        merged: false,
      },
    );
    repo.consume(
      &event(EventKind::PullRequest, 7, 900),
      &Payload::PullRequest {
        action: PullRequestAction::Closed,
        pull_request_id: 9,
        merged: true,
      },
    );
    repo
  }

  #[test]
  fn score_sums_all_four_terms() {
    let repo = busy_repo();
    let norm = Normalization {
      max_commits: 20,
      max_commits_per_developer: 10.0,
      min_average_issue_open_time: 600.0,
      min_average_merge_time: 450.0,
    };
    // 0.5 + 1.0 + 0.5 + 0.5
    assert!((repo.compute_score(&norm, ScoreMode::AllTerms) - 2.5).abs() < 1e-9);
  }

  #[test]
  fn legacy_score_drops_merge_term() {
    let repo = busy_repo();
    let norm = Normalization {
      max_commits: 20,
      max_commits_per_developer: 10.0,
      min_average_issue_open_time: 600.0,
      min_average_merge_time: 450.0,
    };
    assert!((repo.compute_score(&norm, ScoreMode::LegacyThreeTerms) - 2.0).abs() < 1e-9);
  }

  #[test]
  fn normalization_observes_extrema() {
    let busy = busy_repo();
    let idle = aggregator();
    let mut norm = Normalization::default();
    norm.observe(&busy);
    norm.observe(&idle);
    assert_eq!(norm.max_commits, 10);
    assert_eq!(norm.max_commits_per_developer, 10.0);
    assert_eq!(norm.min_average_issue_open_time, 1_200.0);
    assert_eq!(norm.min_average_merge_time, 900.0);
  }
}
