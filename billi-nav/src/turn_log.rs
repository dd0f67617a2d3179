//! Corner detection from evasive-turn frequency.
//!
//! A robot wedged in a corner keeps hitting obstacles right after turning
//! away from them. If the last `capacity` evasive turns all happened within
//! `timeframe`, a random pick is unlikely to help and the navigator should
//! look both ways instead.

use std::collections::VecDeque;
use std::time::Duration;

/// Bounded FIFO of recent evasive-turn timestamps.
///
/// Timestamps are offsets from the navigator's start, not wall-clock times.
#[derive(Debug, Clone)]
pub struct RecentTurnLog {
    turns: VecDeque<Duration>,
    capacity: usize,
    timeframe: Duration,
}

impl RecentTurnLog {
    /// `capacity` is clamped to at least 1
    pub fn new(capacity: usize, timeframe: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
            timeframe,
        }
    }

    /// Record an evasive turn, evicting the oldest entry when full
    pub fn push(&mut self, at: Duration) {
        self.turns.push_back(at);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// True when the log is full and its oldest turn is younger than the timeframe
    pub fn needs_look_around(&self, now: Duration) -> bool {
        if self.turns.len() < self.capacity {
            return false;
        }
        match self.turns.front() {
            Some(&oldest) => now.saturating_sub(oldest) < self.timeframe,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<Duration> {
        self.turns.front().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_not_full_never_fires() {
        let mut log = RecentTurnLog::new(3, secs(15));
        log.push(secs(1));
        log.push(secs(2));
        assert!(!log.needs_look_around(secs(2)));
    }

    #[test]
    fn test_fires_when_full_and_recent() {
        let mut log = RecentTurnLog::new(3, secs(15));
        for t in [1, 2, 3] {
            log.push(secs(t));
        }
        assert!(log.needs_look_around(secs(3)));
        assert!(log.needs_look_around(Duration::from_millis(15_999)));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let mut log = RecentTurnLog::new(3, secs(15));
        for t in [1, 2, 3] {
            log.push(secs(t));
        }
        // now - oldest == timeframe
        assert!(!log.needs_look_around(secs(16)));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut log = RecentTurnLog::new(3, secs(15));
        for t in [0, 20, 21, 22] {
            log.push(secs(t));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.oldest(), Some(secs(20)));
        assert!(log.needs_look_around(secs(22)));
    }

    #[test]
    fn test_length_bounded() {
        let mut log = RecentTurnLog::new(2, secs(1));
        for t in 0..50 {
            log.push(Duration::from_millis(t * 10));
            assert!(log.len() <= log.capacity());
        }
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = RecentTurnLog::new(0, secs(5));
        assert_eq!(log.capacity(), 1);
        log.push(secs(1));
        assert!(log.needs_look_around(secs(2)));
    }
}
