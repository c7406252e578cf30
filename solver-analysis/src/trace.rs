//! Bounded trace of periodic iteration snapshots, used for speed analysis.

use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

use crate::density::NUM_OPERATION_TYPE;
use crate::iteration::EdgeWeightMode;
use crate::settings::TraceOverflow;

/// Wall-clock source for trace timestamps.
pub trait Clock {
    /// Seconds since the clock was last reset.
    fn elapsed_secs(&self) -> f64;

    fn reset(&mut self);
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct InstantClock {
    start: Instant,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for InstantClock {
    fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn reset(&mut self) {
        self.start = Instant::now();
    }
}

/// One snapshot of the iteration state.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub iteration: usize,
    pub time: f64,
    /// Running densities, indexed by operation type.
    pub densities: [f64; NUM_OPERATION_TYPE],
    /// Costly DSE measure when steepest edge is active, otherwise zero.
    pub aux0: f64,
    pub edge_weight_mode: EdgeWeightMode,
}

/// Outcome of [`TraceBuffer::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAppend {
    /// Stored within the current capacity.
    Stored,
    /// Stored after evicting the oldest record.
    Evicted,
    /// Stored after doubling the capacity.
    Grown,
}

/// Fixed-capacity sequence of trace records.
///
/// An append never writes past the capacity: depending on the
/// [`TraceOverflow`] policy the oldest record is dropped or the capacity is
/// doubled.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    overflow: TraceOverflow,
    num_evicted: u64,
}

impl TraceBuffer {
    pub fn with_capacity(capacity: usize, overflow: TraceOverflow) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            overflow,
            num_evicted: 0,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.num_evicted = 0;
    }

    pub fn append(&mut self, record: TraceRecord) -> TraceAppend {
        let outcome = if self.records.len() < self.capacity {
            TraceAppend::Stored
        } else {
            match self.overflow {
                TraceOverflow::DropOldest => {
                    self.records.pop_front();
                    self.num_evicted += 1;
                    log::debug!("trace full at {} records: evicted oldest", self.capacity);
                    TraceAppend::Evicted
                }
                TraceOverflow::Grow => {
                    self.capacity *= 2;
                    self.records.reserve(self.capacity - self.records.len());
                    TraceAppend::Grown
                }
            }
        };
        self.records.push_back(record);
        debug_assert!(self.records.len() <= self.capacity);
        outcome
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records dropped by the [`TraceOverflow::DropOldest`] policy.
    pub fn num_evicted(&self) -> u64 {
        self.num_evicted
    }

    pub fn records(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(iteration: usize) -> TraceRecord {
        TraceRecord {
            iteration,
            time: iteration as f64,
            densities: [0.0; NUM_OPERATION_TYPE],
            aux0: 0.0,
            edge_weight_mode: EdgeWeightMode::SteepestEdge,
        }
    }

    #[test]
    fn test_drop_oldest_keeps_capacity() {
        let mut t = TraceBuffer::with_capacity(3, TraceOverflow::DropOldest);
        for i in 0..3 {
            assert_eq!(t.append(rec(i)), TraceAppend::Stored);
        }
        assert_eq!(t.append(rec(3)), TraceAppend::Evicted);
        assert_eq!(t.append(rec(4)), TraceAppend::Evicted);
        assert_eq!(t.len(), 3);
        assert_eq!(t.capacity(), 3);
        assert_eq!(t.num_evicted(), 2);
        let iters: Vec<usize> = t.records().map(|r| r.iteration).collect();
        assert_eq!(iters, vec![2, 3, 4]);
    }

    #[test]
    fn test_grow_keeps_everything() {
        let mut t = TraceBuffer::with_capacity(2, TraceOverflow::Grow);
        t.append(rec(0));
        t.append(rec(1));
        assert_eq!(t.append(rec(2)), TraceAppend::Grown);
        assert_eq!(t.capacity(), 4);
        assert_eq!(t.append(rec(3)), TraceAppend::Stored);
        assert_eq!(t.len(), 4);
        assert_eq!(t.records().next().map(|r| r.iteration), Some(0));
        assert_eq!(t.last().map(|r| r.iteration), Some(3));
    }

    #[test]
    fn test_clear() {
        let mut t = TraceBuffer::with_capacity(1, TraceOverflow::DropOldest);
        t.append(rec(0));
        t.append(rec(1));
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.num_evicted(), 0);
    }

    #[test]
    fn test_instant_clock_is_monotone() {
        let mut c = InstantClock::default();
        let a = c.elapsed_secs();
        let b = c.elapsed_secs();
        assert!(b >= a);
        c.reset();
        assert!(c.elapsed_secs() >= 0.0);
    }
}
