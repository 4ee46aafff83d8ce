//! Engine configuration with sane defaults.

/// How the four sub-metric raw scores are combined into a repository's health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
  /// Commit volume + commits per developer + issue open time + pull-request merge time.
  #[default]
  AllTerms,
  /// Historical behaviour: the merge-time term is computed but never added.
  LegacyThreeTerms,
}

/// Tunables for one scoring run.
#[derive(Debug, Clone)]
pub struct Config {
  pub score_mode: ScoreMode,
  /// Dispatch shards; events are partitioned by repository id.
  pub workers: usize,
  /// Root of the hourly archive, without trailing slash.
  pub archive_base_url: String,
  pub user_agent: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      score_mode: ScoreMode::AllTerms,
      workers: 1,
      archive_base_url: "https://data.gharchive.org".to_string(),
      user_agent: concat!("health-engine/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}
