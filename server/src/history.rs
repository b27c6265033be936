use std::collections::VecDeque;

use shared::models::{Batch, Reading, Snapshot, TrendPoint};

pub const DEFAULT_WINDOW: usize = 60;

/// The most recent batches of the session, oldest first.
///
/// Only a sliding window is kept in memory; trends older than the window are
/// read back from the store.
#[derive(Clone, Debug)]
pub struct History {
    window: usize,
    batches: VecDeque<Batch>,
}

impl Default for History {
    fn default() -> Self {
        History::new(DEFAULT_WINDOW)
    }
}

impl History {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        History {
            window,
            batches: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, batch: Batch) {
        while self.batches.len() >= self.window {
            self.batches.pop_front();
        }
        self.batches.push_back(batch);
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.batches().flat_map(|b| b.readings.iter())
    }

    /// Long form series, one point per metric and reading.
    pub fn trend_points(&self) -> Vec<TrendPoint> {
        self.readings().flat_map(Reading::trend_points).collect()
    }
}

/// Everything the presentation side can see: the last snapshot and the window.
#[derive(Clone, Debug, Default)]
pub struct Board {
    pub latest: Option<Snapshot>,
    pub history: History,
}

impl Board {
    pub fn new(window: usize) -> Self {
        Board {
            latest: None,
            history: History::new(window),
        }
    }

    pub fn publish(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot.batch.clone());
        self.latest = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::reading;
    use chrono::Utc;
    use shared::models::Metric;

    fn batch(cycle: u32, size: usize) -> Batch {
        Batch {
            cycle,
            started_at: Utc::now(),
            readings: (0..size).map(|i| reading(&format!("P{}", i), 10, 30.0)).collect(),
        }
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut history = History::new(3);
        for cycle in 1..=5 {
            history.push(batch(cycle, 2));
        }
        let cycles: Vec<u32> = history.batches().map(|b| b.cycle).collect();
        assert_eq!(cycles, vec![3, 4, 5]);
        assert_eq!(history.readings().count(), 6);
    }

    #[test]
    fn test_zero_window_keeps_last_batch() {
        let mut history = History::new(0);
        history.push(batch(1, 1));
        history.push(batch(2, 1));
        assert_eq!(history.len(), 1);
        assert_eq!(history.batches().next().unwrap().cycle, 2);
    }

    #[test]
    fn test_trend_points_are_melted() {
        let mut history = History::new(10);
        history.push(batch(1, 2));
        history.push(batch(2, 3));

        let points = history.trend_points();
        assert_eq!(points.len(), 10);
        for pair in points.chunks(2) {
            assert_eq!((pair[0].metric, pair[0].value), (Metric::AvgSpeed, 30.0));
            assert_eq!((pair[1].metric, pair[1].value), (Metric::CongestionLevel, 10.0));
        }
    }

    #[test]
    fn test_publish_updates_latest_and_history() {
        let mut board = Board::new(5);
        assert!(board.latest.is_none());

        board.publish(Snapshot::new(batch(1, 2), 0, 0));
        board.publish(Snapshot::new(batch(2, 1), 1, 0));

        assert_eq!(board.latest.as_ref().unwrap().batch.cycle, 2);
        assert_eq!(board.latest.as_ref().unwrap().summary.dropped_points, 1);
        assert_eq!(board.history.len(), 2);
    }
}
