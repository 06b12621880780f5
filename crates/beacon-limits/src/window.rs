use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

/// Counts timestamped events inside a sliding window.
///
/// Entries at or before `now - window` are discarded on every read, so the
/// stored sequence never grows past the events of one window. Insertion
/// order is assumed non-decreasing, which holds because the owning gate
/// records under a single lock.
#[derive(Clone, Debug)]
pub struct SlidingWindowCounter {
    window: Duration,
    events: VecDeque<DateTime<Utc>>,
}

impl SlidingWindowCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            events: VecDeque::new(),
        }
    }

    /// Record an event at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.events.push_back(now);
    }

    /// Prune expired entries, then return the number of events still inside
    /// the window (strictly newer than `now - window`).
    pub fn count(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        while self
            .events
            .front()
            .is_some_and(|&first| first <= cutoff)
        {
            self.events.pop_front();
        }
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_counter_is_zero() {
        let mut counter = SlidingWindowCounter::new(Duration::minutes(10));
        assert_eq!(counter.count(t0()), 0);
    }

    #[test]
    fn counts_events_inside_window() {
        let mut counter = SlidingWindowCounter::new(Duration::minutes(10));
        counter.record(t0());
        counter.record(t0() + Duration::minutes(1));
        counter.record(t0() + Duration::minutes(2));
        assert_eq!(counter.count(t0() + Duration::minutes(3)), 3);
    }

    #[test]
    fn prunes_expired_events() {
        let mut counter = SlidingWindowCounter::new(Duration::minutes(10));
        counter.record(t0());
        counter.record(t0() + Duration::minutes(9));
        // First event is exactly 10 minutes old at t0+10, right at the cutoff, so gone.
        assert_eq!(counter.count(t0() + Duration::minutes(10)), 1);
        assert_eq!(counter.count(t0() + Duration::minutes(19)), 1);
        assert_eq!(counter.count(t0() + Duration::minutes(20)), 0);
    }

    #[test]
    fn prune_compacts_storage() {
        let mut counter = SlidingWindowCounter::new(Duration::minutes(1));
        for i in 0..100 {
            counter.record(t0() + Duration::seconds(i));
        }
        assert_eq!(counter.count(t0() + Duration::minutes(10)), 0);
        assert!(counter.events.is_empty());
    }

    #[test]
    fn zero_window_always_zero() {
        let mut counter = SlidingWindowCounter::new(Duration::zero());
        counter.record(t0());
        assert_eq!(counter.count(t0()), 0);
    }
}
