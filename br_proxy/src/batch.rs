use std::time::{Duration, Instant};

/// The starting guess for how long a single chunk takes to send.
const INITIAL_NANOS_PER_CHUNK: f64 = 2_000_000.0;
/// Once this many samples have been taken, new samples all have the same
/// influence on the average.
const MAX_WEIGHT: u32 = 49;
/// Samples are clamped to within this factor of the current average.
const CLAMP_COEFFICIENT: f64 = 3.0;
/// How long we are allowed to spend sending chunks every tick.
const TICK_BUDGET_NANOS: f64 = 7_000_000.0;

/// Tracks how long it takes to send chunks, and uses that to decide how many
/// chunks should be sent every tick.
///
/// This uses a weighted moving average. Every sample is clamped to within 3x
/// of the current average, so that one slow batch (a page fault, or the OS
/// scheduling something else) can't throw off the estimate.
#[derive(Debug, Clone)]
pub struct ChunkBatchSizeCalculator {
  aggregated_nanos_per_chunk: f64,
  weight:                     u32,
  batch_start:                Option<Instant>,
}

impl Default for ChunkBatchSizeCalculator {
  fn default() -> Self { ChunkBatchSizeCalculator::new() }
}

impl ChunkBatchSizeCalculator {
  pub fn new() -> Self {
    ChunkBatchSizeCalculator {
      aggregated_nanos_per_chunk: INITIAL_NANOS_PER_CHUNK,
      weight:                     1,
      batch_start:                None,
    }
  }

  /// Marks the start of a batch.
  pub fn on_batch_start(&mut self) { self.batch_start = Some(Instant::now()); }

  /// Finishes a batch of `batch_size` chunks, which started at the last call
  /// to [`on_batch_start`](Self::on_batch_start). If no batch was started,
  /// this does nothing.
  pub fn on_batch_finished(&mut self, batch_size: u32) {
    if let Some(start) = self.batch_start.take() {
      self.on_batch_finished_after(batch_size, start.elapsed());
    }
  }

  /// Records a batch of `batch_size` chunks that took `elapsed` to send. A
  /// batch size of 0 is ignored.
  pub fn on_batch_finished_after(&mut self, batch_size: u32, elapsed: Duration) {
    if batch_size == 0 {
      return;
    }
    let sample = elapsed.as_nanos() as f64 / f64::from(batch_size);
    let agg = self.aggregated_nanos_per_chunk;
    let sample = sample.clamp(agg / CLAMP_COEFFICIENT, agg * CLAMP_COEFFICIENT);
    let weight = f64::from(self.weight);
    self.aggregated_nanos_per_chunk = (agg * weight + sample) / (weight + 1.0);
    self.weight = (self.weight + 1).min(MAX_WEIGHT);
  }

  /// The current estimate of how long one chunk takes to send.
  pub fn aggregated_nanos_per_chunk(&self) -> f64 { self.aggregated_nanos_per_chunk }

  /// How many chunks should be sent this tick. This is a hint, and may be
  /// less than one.
  pub fn desired_chunks_per_tick(&self) -> f64 {
    TICK_BUDGET_NANOS / self.aggregated_nanos_per_chunk
  }
}
