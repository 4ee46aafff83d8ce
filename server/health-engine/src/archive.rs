//! Hourly archive sources: URL resolution, HTTP fetch, gzip line decoding.

use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::read::MultiGzDecoder;

use crate::config::Config;
use crate::error::EngineError;
use crate::normalize;
use crate::shard::ShardedRun;
use crate::window::Window;

const LOG_TARGET: &str = "health_engine::archive";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// `{base}/YYYY-MM-DD-H.json.gz`; the hour is not zero-padded.
pub fn hour_url(base: &str, hour: DateTime<Utc>) -> String {
  format!(
    "{}/{:04}-{:02}-{:02}-{}.json.gz",
    base.trim_end_matches('/'),
    hour.year(),
    hour.month(),
    hour.day(),
    hour.hour()
  )
}

pub fn hour_urls(base: &str, window: &Window) -> Vec<String> {
  window
    .archive_hours()
    .into_iter()
    .map(|hour| hour_url(base, hour))
    .collect()
}

/// Fetches whole archive files; no retries.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
  client: reqwest::Client,
}

impl ArchiveClient {
  pub fn new(config: &Config) -> Result<Self, EngineError> {
    let client = reqwest::Client::builder()
      .user_agent(config.user_agent.clone())
      .build()?;
    Ok(Self { client })
  }

  pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, EngineError> {
    log::debug!(target: LOG_TARGET, "Fetching {url}");
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(EngineError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }
    let body = response.bytes().await?;
    log::debug!(target: LOG_TARGET, "Fetched {url} ({} bytes)", body.len());
    Ok(body.to_vec())
  }
}

/// Read a local archive file (gzip or plain JSON lines).
pub fn read_file(path: &Path) -> Result<Vec<u8>, EngineError> {
  Ok(std::fs::read(path)?)
}

/// Split an archive body into lines, gunzipping when it carries the gzip magic bytes.
pub fn read_lines(body: Vec<u8>) -> Box<dyn Iterator<Item = Result<String, EngineError>>> {
  let reader: Box<dyn Read> = if body.starts_with(&GZIP_MAGIC) {
    Box::new(MultiGzDecoder::new(Cursor::new(body)))
  } else {
    Box::new(Cursor::new(body))
  };
  Box::new(BufReader::new(reader).lines().map(|line| line.map_err(EngineError::from)))
}

/// Lines seen and rejected for one archive source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceTally {
  pub lines: u64,
  pub malformed: u64,
  /// False when a read or decode error cut the source short.
  pub complete: bool,
}

/// Parse every line of one archive body and dispatch the batch. A decode error ends this
/// source only; the lines read before it are kept.
pub fn ingest(run: &mut ShardedRun, source: &str, body: Vec<u8>) -> SourceTally {
  let mut tally = SourceTally {
    complete: true,
    ..SourceTally::default()
  };
  let mut batch = Vec::new();

  for line in read_lines(body) {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        log::warn!(target: LOG_TARGET, "{source}: stopped reading after {} line(s): {e}", tally.lines);
        tally.complete = false;
        break;
      }
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    tally.lines += 1;

    match normalize::parse_line(trimmed) {
      Ok(pair) => batch.push(pair),
      Err(e) => {
        tally.malformed += 1;
        log::debug!(target: LOG_TARGET, "{source}: dropping line {}: {e}", tally.lines);
      }
    }
  }

  run.dispatch_batch(batch);
  log::info!(
    target: LOG_TARGET,
    "Processed {source}: {} line(s), {} malformed",
    tally.lines,
    tally.malformed
  );
  tally
}

/// Fetch and ingest each hour in order. Returns how many hours were skipped.
pub async fn ingest_urls(client: &ArchiveClient, urls: &[String], run: &mut ShardedRun) -> usize {
  let mut skipped = 0;
  for url in urls {
    match client.fetch(url).await {
      Ok(body) => {
        ingest(run, url, body);
      }
      Err(e) => {
        log::warn!(target: LOG_TARGET, "Skipping {url}: {e}");
        skipped += 1;
      }
    }
  }
  skipped
}

/// Read and ingest local archive files. Returns how many files were skipped.
pub fn ingest_files(paths: &[PathBuf], run: &mut ShardedRun) -> usize {
  let mut skipped = 0;
  for path in paths {
    let name = path.display().to_string();
    match read_file(path) {
      Ok(body) => {
        ingest(run, &name, body);
      }
      Err(e) => {
        log::warn!(target: LOG_TARGET, "Skipping {name}: {e}");
        skipped += 1;
      }
    }
  }
  skipped
}
