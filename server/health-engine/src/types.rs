//! Core types for the health engine (archive JSON contract + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract, one archive line)
// ---------------------------------------------------------------------------

/// One archive line. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
  #[serde(deserialize_with = "id_from_string_or_number")]
  pub id: u64,
  #[serde(rename = "type")]
  pub kind: String,
  pub actor: InboundActor,
  pub repo: InboundRepo,
  #[serde(default)]
  pub payload: serde_json::Value,
  pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundActor {
  pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundRepo {
  pub id: u64,
  /// `org/name`.
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundPushPayload {
  pub distinct_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundIssuesPayload {
  pub action: String,
  pub issue: InboundEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundPullRequestPayload {
  pub action: String,
  pub pull_request: InboundPullRequest,
  #[serde(default)]
  pub merged: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundEntity {
  pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundPullRequest {
  pub id: u64,
  #[serde(default)]
  pub merged: Option<bool>,
}

/// Event ids appear as strings in newer archive files and as numbers in older ones.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Number(u64),
    Text(String),
  }

  match RawId::deserialize(deserializer)? {
    RawId::Number(n) => Ok(n),
    RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
  }
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// Repository identity plus display names. Only `id` participates in aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryKey {
  pub id: u64,
  pub organization: String,
  pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Push,
  Issues,
  PullRequest,
  Ignored,
}

impl EventKind {
  pub fn from_archive_type(s: &str) -> Self {
    match s {
      "PushEvent" => Self::Push,
      "IssuesEvent" => Self::Issues,
      "PullRequestEvent" => Self::PullRequest,
      _ => Self::Ignored,
    }
  }
}

/// Canonical event after parsing + validation.
#[derive(Debug, Clone)]
pub struct Event {
  pub id: u64,
  pub kind: EventKind,
  pub repo: RepositoryKey,
  pub actor_id: u64,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
  Opened,
  Closed,
  Reopened,
  Ignored,
}

impl IssueAction {
  pub fn from_archive_action(s: &str) -> Self {
    match s {
      "opened" => Self::Opened,
      "closed" => Self::Closed,
      "reopened" => Self::Reopened,
      _ => Self::Ignored,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
  Opened,
  Closed,
  Ignored,
}

impl PullRequestAction {
  pub fn from_archive_action(s: &str) -> Self {
    match s {
      "opened" => Self::Opened,
      "closed" => Self::Closed,
      _ => Self::Ignored,
    }
  }
}

/// Type-specific part of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  Push {
    distinct_commits: u64,
  },
  Issues {
    action: IssueAction,
    issue_id: u64,
  },
  PullRequest {
    action: PullRequestAction,
    pull_request_id: u64,
    merged: bool,
  },
  Ignored,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row of the ranked result set.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryScore {
  pub repository_id: u64,
  pub organization: String,
  pub repository: String,
  pub score: f64,
  pub commit_count: u64,
}
