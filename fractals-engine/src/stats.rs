use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

use fractals_core::TileResult;

/// Last observed band timings for one worker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WorkerStat {
    pub worker_id: usize,
    pub last_preview_ms: f64,
    pub last_full_res_ms: f64,
}

/// Per-worker timings with a rate-limited broadcast.
///
/// Stats are indexed by the pool's stable worker id and never reordered.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    stats: Vec<WorkerStat>,
    interval: Duration,
    last_broadcast: Option<Instant>,
}

impl StatsAggregator {
    pub fn new(worker_count: usize, interval: Duration) -> Self {
        Self {
            stats: (0..worker_count)
                .map(|worker_id| WorkerStat {
                    worker_id,
                    ..WorkerStat::default()
                })
                .collect(),
            interval,
            last_broadcast: None,
        }
    }

    pub fn stats(&self) -> &[WorkerStat] {
        &self.stats
    }

    /// Store the timing of `result` and report whether a broadcast is due.
    ///
    /// The first record ever is always due; after that, only once `interval`
    /// has passed since the last due record.
    pub fn record(&mut self, result: &TileResult, now: Instant) -> bool {
        let Some(stat) = self.stats.get_mut(result.worker_id) else {
            warn!(
                worker_id = result.worker_id,
                workers = self.stats.len(),
                "Timing from unknown worker ignored"
            );
            return false;
        };

        let ms = result.elapsed_ms();
        if result.full_res {
            stat.last_full_res_ms = ms;
        } else {
            stat.last_preview_ms = ms;
        }

        let due = self
            .last_broadcast
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_broadcast = Some(now);
        }
        due
    }
}
