//! The inclusive [from, to] time window a run aggregates over.

use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::error::EngineError;

/// Immutable pair of instants with `from < to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  from: DateTime<Utc>,
  to: DateTime<Utc>,
}

impl Window {
  pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, EngineError> {
    if from >= to {
      return Err(EngineError::invalid_window(format!(
        "start {} must be before end {}",
        from.to_rfc3339(),
        to.to_rfc3339()
      )));
    }
    Ok(Self { from, to })
  }

  /// Parse two ISO-8601 zoned timestamps (any offset) into a window.
  pub fn parse(from: &str, to: &str) -> Result<Self, EngineError> {
    Self::new(parse_instant("from", from)?, parse_instant("to", to)?)
  }

  pub fn start(&self) -> DateTime<Utc> {
    self.from
  }

  pub fn end(&self) -> DateTime<Utc> {
    self.to
  }

  /// Inclusive on both bounds.
  pub fn contains(&self, t: DateTime<Utc>) -> bool {
    t >= self.from && t <= self.to
  }

  pub fn length_seconds(&self) -> i64 {
    (self.to - self.from).num_seconds()
  }

  /// Start of every archive hour overlapping the window: `from` truncated to the hour,
  /// stepping one hour while strictly before `to`.
  pub fn archive_hours(&self) -> Vec<DateTime<Utc>> {
    let mut hour = self
      .from
      .duration_trunc(Duration::hours(1))
      .unwrap_or(self.from);
    let mut hours = Vec::new();
    while hour < self.to {
      hours.push(hour);
      hour += Duration::hours(1);
    }
    hours
  }
}

/// RFC 3339, or ISO-8601 with the seconds left out (`2019-08-01T00:00Z`).
fn parse_instant(field: &str, s: &str) -> Result<DateTime<Utc>, EngineError> {
  let s = s.trim();
  DateTime::parse_from_rfc3339(s)
    .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%#z"))
    .map(|t| t.with_timezone(&Utc))
    .map_err(|e| EngineError::invalid_window(format!("{}: invalid ISO-8601 timestamp {:?}: {}", field, s, e)))
}
