//! Ranked score table as CSV: `org,repo_name,health_score,num_commits`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};

use crate::error::EngineError;
use crate::types::RepositoryScore;

pub const CSV_HEADER: [&str; 4] = ["org", "repo_name", "health_score", "num_commits"];

/// Newlines become spaces; quoting of commas and quotes is left to the CSV writer.
fn display_name(s: &str) -> String {
  s.replace(['\r', '\n'], " ")
}

/// Integral scores keep a trailing `.0` (`4.0`, not `4`).
fn format_score(score: f64) -> String {
  let text = score.to_string();
  if score.is_finite() && !text.contains('.') {
    format!("{text}.0")
  } else {
    text
  }
}

/// Write the header and one record per repository, in the given order.
pub fn write_csv<W: Write>(writer: W, scores: &[RepositoryScore]) -> Result<(), EngineError> {
  let mut csv = WriterBuilder::new()
    .quote_style(QuoteStyle::Necessary)
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(writer);

  csv.write_record(CSV_HEADER)?;
  for s in scores {
    csv.write_record([
      display_name(&s.organization),
      display_name(&s.repository),
      format_score(s.score),
      s.commit_count.to_string(),
    ])?;
  }
  csv.flush()?;
  Ok(())
}

/// Append the table to `path`, creating it if needed. Every run writes its own header.
pub fn append_csv(path: &Path, scores: &[RepositoryScore]) -> Result<(), EngineError> {
  let file = OpenOptions::new().create(true).append(true).open(path)?;
  write_csv(file, scores)
}
