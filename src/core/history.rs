//! Bounded log of significant gaps.
//!
//! Append-only; once `capacity` is reached the oldest record is evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::gaps::Gap;
use crate::core::types::Exchange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRecord {
    pub symbol: String,
    /// Percent
    pub spread: f64,
    pub low_exchange: Exchange,
    pub high_exchange: Exchange,
    /// Epoch ms
    pub timestamp: u64,
}

/// FIFO ring of `GapRecord`s. `by_symbol` is a linear scan.
#[derive(Debug)]
pub struct GapHistoryLog {
    records: VecDeque<GapRecord>,
    capacity: usize,
}

impl GapHistoryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, record: GapRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Last `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<GapRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    /// Last `limit` records for `symbol`, oldest first
    pub fn by_symbol(&self, symbol: &str, limit: usize) -> Vec<GapRecord> {
        let mut matches: Vec<GapRecord> = self
            .records
            .iter()
            .rev()
            .filter(|r| r.symbol == symbol)
            .take(limit)
            .cloned()
            .collect();
        matches.reverse();
        matches
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append every gap with `spread >= min_spread`; returns how many were stored
    pub fn record_significant(&mut self, gaps: &[Gap], min_spread: f64, timestamp: u64) -> usize {
        let mut recorded = 0;
        for gap in gaps.iter().filter(|g| g.spread >= min_spread) {
            self.append(gap.to_record(timestamp));
            recorded += 1;
        }
        recorded
    }
}

impl Default for GapHistoryLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}
