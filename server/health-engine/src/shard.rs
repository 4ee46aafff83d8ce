//! Parallel dispatch: events partitioned by repository id across independent coordinators.

use rayon::prelude::*;

use crate::config::Config;
use crate::engine::RunCoordinator;
use crate::types::{Event, Payload};
use crate::window::Window;

/// `workers` coordinators, each owning the repositories whose `id % workers` is its index.
#[derive(Debug)]
pub struct ShardedRun {
  shards: Vec<RunCoordinator>,
}

impl ShardedRun {
  pub fn new(window: Window, config: &Config) -> Self {
    let workers = config.workers.max(1);
    Self {
      shards: (0..workers).map(|_| RunCoordinator::new(window, config)).collect(),
    }
  }

  pub fn workers(&self) -> usize {
    self.shards.len()
  }

  fn shard_of(&self, event: &Event) -> usize {
    (event.repo.id % self.shards.len() as u64) as usize
  }

  /// Partition a batch by repository and drain every partition into its own shard in parallel.
  pub fn dispatch_batch(&mut self, batch: Vec<(Event, Payload)>) {
    if self.shards.len() == 1 {
      let shard = &mut self.shards[0];
      for (event, payload) in &batch {
        shard.dispatch(event, payload);
      }
      return;
    }

    let mut partitions: Vec<Vec<(Event, Payload)>> = vec![Vec::new(); self.shards.len()];
    for (event, payload) in batch {
      let idx = self.shard_of(&event);
      partitions[idx].push((event, payload));
    }

    self
      .shards
      .par_iter_mut()
      .zip(partitions.into_par_iter())
      .for_each(|(shard, partition)| {
        for (event, payload) in &partition {
          shard.dispatch(event, payload);
        }
      });
  }

  /// Merge all shards into one coordinator; their repository sets are disjoint.
  pub fn into_coordinator(self) -> Option<RunCoordinator> {
    let mut shards = self.shards.into_iter();
    let mut merged = shards.next()?;
    for shard in shards {
      merged.merge(shard);
    }
    Some(merged)
  }
}
