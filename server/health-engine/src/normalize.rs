//! Normalize archive lines into canonical (Event, Payload) pairs.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::types::*;

/// Parse one archive JSON line into an event and its typed payload.
///
/// Event types outside push/issues/pull-request are returned as `EventKind::Ignored`
/// with `Payload::Ignored`; they are never an error.
pub fn parse_line(line: &str) -> Result<(Event, Payload), EngineError> {
  let raw: InboundEvent = serde_json::from_str(line)?;
  normalize(raw)
}

/// Validate an already-deserialized archive event.
pub fn normalize(raw: InboundEvent) -> Result<(Event, Payload), EngineError> {
  let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&raw.created_at)
    .map_err(|e| EngineError::validation("created_at", &format!("invalid RFC3339: {}", e)))?
    .with_timezone(&Utc);

  let repo = split_repository(raw.repo.id, &raw.repo.name)?;
  let kind = EventKind::from_archive_type(&raw.kind);

  let payload = match kind {
    EventKind::Push => {
      let p: InboundPushPayload = payload_field("payload.distinct_size", raw.payload)?;
      Payload::Push {
        distinct_commits: p.distinct_size,
      }
    }
    EventKind::Issues => {
      let p: InboundIssuesPayload = payload_field("payload.issue", raw.payload)?;
      Payload::Issues {
        action: IssueAction::from_archive_action(&p.action),
        issue_id: p.issue.id,
      }
    }
    EventKind::PullRequest => {
      let p: InboundPullRequestPayload = payload_field("payload.pull_request", raw.payload)?;
      Payload::PullRequest {
        action: PullRequestAction::from_archive_action(&p.action),
        pull_request_id: p.pull_request.id,
        merged: p.pull_request.merged.or(p.merged).unwrap_or(false),
      }
    }
    EventKind::Ignored => Payload::Ignored,
  };

  let event = Event {
    id: raw.id,
    kind,
    repo,
    actor_id: raw.actor.id,
    timestamp,
  };
  Ok((event, payload))
}

fn payload_field<T: serde::de::DeserializeOwned>(
  field: &str,
  value: serde_json::Value,
) -> Result<T, EngineError> {
  serde_json::from_value(value).map_err(|e| EngineError::validation(field, &e.to_string()))
}

/// Split `org/name` at the first slash; both halves must be non-empty.
fn split_repository(id: u64, full_name: &str) -> Result<RepositoryKey, EngineError> {
  match full_name.split_once('/') {
    Some((org, name)) if !org.is_empty() && !name.is_empty() => Ok(RepositoryKey {
      id,
      organization: org.to_string(),
      name: name.to_string(),
    }),
    _ => Err(EngineError::validation("repo.name", "expected org/name")),
  }
}
