//! Repository Health Score Engine: streaming aggregation over archive activity.
//!
//! Consumes parsed push, issue and pull-request events for a time window, keeps
//! per-repository sub-metrics (commit volume, commits per developer, issue open
//! time, pull-request merge time), normalizes them across every repository in the
//! run, and emits a ranked score table.
//!
//! In-memory state only; one run per process.

pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod repository;
pub mod shard;
pub mod trackers;
pub mod types;
pub mod window;

pub use config::{Config, ScoreMode};
pub use engine::{RunCoordinator, RunStats};
pub use error::EngineError;
pub use shard::ShardedRun;
pub use types::{Event, Payload, RepositoryScore};
pub use window::Window;
