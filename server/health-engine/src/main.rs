//! Binary entrypoint: fetch (or read) archive hours, score repositories, append CSV.
//!
//! Malformed lines are logged and skipped. A window with `from >= to` is rejected
//! before anything is fetched.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use health_engine::archive::{self, ArchiveClient};
use health_engine::{report, Config, EngineError, ScoreMode, ShardedRun, Window};

const LOG_TARGET: &str = "health_engine";

#[derive(Debug, Parser)]
#[command(name = "health-engine", version, about = "Rank repositories by health score over a time window")]
struct Args {
  /// Window start (ISO-8601 with offset), e.g. 2019-08-01T00:00:00Z or 2019-08-01T00:00Z
  from: String,

  /// Window end, e.g. 2019-09-01T00:00:00Z
  to: String,

  /// CSV file the ranked table is appended to
  #[arg(long, short, default_value = "health_scores.csv")]
  output: PathBuf,

  /// Read these archive files (gzip or plain JSON lines) instead of fetching
  #[arg(long = "input", short)]
  inputs: Vec<PathBuf>,

  /// Number of dispatch shards
  #[arg(long, default_value_t = 1)]
  workers: usize,

  /// Leave the pull-request merge-time term out of the score
  #[arg(long)]
  legacy_three_term_score: bool,

  /// Archive root URL
  #[arg(long, default_value = "https://data.gharchive.org")]
  archive_url: String,

  /// Log at debug level
  #[arg(long, short)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
  let args = Args::parse();

  let level = if args.verbose { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", level))
    .format_timestamp(None)
    .format_module_path(false)
    .init();

  match run(args).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!(target: LOG_TARGET, "{e}");
      ExitCode::FAILURE
    }
  }
}

async fn run(args: Args) -> Result<(), EngineError> {
  let window = Window::parse(&args.from, &args.to)?;
  let config = Config {
    score_mode: if args.legacy_three_term_score {
      ScoreMode::LegacyThreeTerms
    } else {
      ScoreMode::AllTerms
    },
    workers: args.workers,
    archive_base_url: args.archive_url,
    ..Config::default()
  };

  let mut sharded = ShardedRun::new(window, &config);

  let failed_sources = if args.inputs.is_empty() {
    let client = ArchiveClient::new(&config)?;
    let urls = archive::hour_urls(&config.archive_base_url, &window);
    log::info!(target: LOG_TARGET, "Fetching {} archive hour(s)", urls.len());
    archive::ingest_urls(&client, &urls, &mut sharded).await
  } else {
    archive::ingest_files(&args.inputs, &mut sharded)
  };

  let Some(coordinator) = sharded.into_coordinator() else {
    return Ok(());
  };
  let stats = coordinator.stats();
  log::info!(
    target: LOG_TARGET,
    "Scored {} repositories from {} events ({} out of window, {} ignored, {} source(s) skipped)",
    coordinator.repository_count(),
    stats.dispatched,
    stats.out_of_window,
    stats.ignored,
    failed_sources
  );

  let scores = coordinator.finalize();
  report::append_csv(&args.output, &scores)?;
  log::info!(target: LOG_TARGET, "Wrote {} rows to {}", scores.len(), args.output.display());
  Ok(())
}
