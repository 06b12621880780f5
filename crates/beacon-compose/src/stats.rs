//! Daily community activity counters.
//!
//! Counters accumulate over one local calendar day and roll over lazily:
//! the first touch after local midnight clears them. The status endpoint
//! reports a snapshot; the composer resets them after the daily post so a
//! manual run mid-day starts a fresh window too.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

pub struct ActivityStats {
    timezone: Tz,
    inner: Mutex<DayCounters>,
}

#[derive(Debug, Clone)]
struct DayCounters {
    day: Option<NaiveDate>,
    messages: u64,
    new_members: u64,
    voice_joins: u64,
    joins_by_hour: [u64; 24],
}

impl DayCounters {
    fn fresh(day: NaiveDate) -> Self {
        Self {
            day: Some(day),
            messages: 0,
            new_members: 0,
            voice_joins: 0,
            joins_by_hour: [0; 24],
        }
    }
}

/// Point-in-time view of today's counters, reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub messages: u64,
    pub new_members: u64,
    pub voice_joins: u64,
    /// Local hour with the most voice joins, as "H:00". Absent until the
    /// first join of the day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<String>,
}

impl ActivityStats {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            inner: Mutex::new(DayCounters::fresh(NaiveDate::MIN)),
        }
    }

    pub fn record_message(&self, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        self.roll(&mut inner, now);
        inner.messages += 1;
    }

    pub fn record_member_join(&self, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        self.roll(&mut inner, now);
        inner.new_members += 1;
    }

    pub fn record_voice_join(&self, now: DateTime<Utc>) {
        let local = now.with_timezone(&self.timezone);
        let mut inner = self.inner.lock();
        self.roll(&mut inner, now);
        inner.voice_joins += 1;
        inner.joins_by_hour[local.hour() as usize] += 1;
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StatsSnapshot {
        let mut inner = self.inner.lock();
        self.roll(&mut inner, now);
        let peak_hour = inner
            .joins_by_hour
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .max_by_key(|&(_, &count)| count)
            .map(|(hour, _)| format!("{hour}:00"));
        StatsSnapshot {
            messages: inner.messages,
            new_members: inner.new_members,
            voice_joins: inner.voice_joins,
            peak_hour,
        }
    }

    /// Clear today's counters. Called after the daily post goes out.
    pub fn reset(&self, now: DateTime<Utc>) {
        let day = now.with_timezone(&self.timezone).date_naive();
        *self.inner.lock() = DayCounters::fresh(day);
        debug!("daily activity counters reset");
    }

    fn roll(&self, inner: &mut DayCounters, now: DateTime<Utc>) {
        let day = now.with_timezone(&self.timezone).date_naive();
        if inner.day != Some(day) {
            *inner = DayCounters::fresh(day);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stats() -> ActivityStats {
        ActivityStats::new(chrono_tz::America::New_York)
    }

    // 14:00 UTC is 10:00 in New York (summer).
    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap()
    }

    #[test]
    fn counters_accumulate_within_a_day() {
        let stats = stats();
        let now = morning();
        stats.record_message(now);
        stats.record_message(now);
        stats.record_member_join(now);
        stats.record_voice_join(now);

        let snap = stats.snapshot(now);
        assert_eq!(snap.messages, 2);
        assert_eq!(snap.new_members, 1);
        assert_eq!(snap.voice_joins, 1);
    }

    #[test]
    fn peak_hour_tracks_local_busiest_hour() {
        let stats = stats();
        let now = morning();
        stats.record_voice_join(now);
        stats.record_voice_join(now + chrono::Duration::hours(3));
        stats.record_voice_join(now + chrono::Duration::hours(3));

        // 17:00 UTC is 13:00 local.
        let snap = stats.snapshot(now + chrono::Duration::hours(3));
        assert_eq!(snap.peak_hour.as_deref(), Some("13:00"));
    }

    #[test]
    fn no_joins_means_no_peak_hour() {
        let stats = stats();
        let snap = stats.snapshot(morning());
        assert!(snap.peak_hour.is_none());
    }

    #[test]
    fn snapshot_serializes_and_omits_absent_peak_hour() {
        let stats = stats();
        let now = morning();
        stats.record_message(now);

        let json = serde_json::to_value(stats.snapshot(now)).unwrap();
        assert_eq!(json["messages"], 1);
        assert!(json.get("peak_hour").is_none());

        // 14:00 UTC is 10:00 local, which becomes the peak hour.
        stats.record_voice_join(now);
        let json = serde_json::to_value(stats.snapshot(now)).unwrap();
        assert_eq!(json["peak_hour"], "10:00");
    }

    #[test]
    fn counters_roll_over_at_local_midnight() {
        let stats = stats();
        let now = morning();
        stats.record_message(now);

        // Same UTC day, but past midnight in New York.
        let after_local_midnight = Utc.with_ymd_and_hms(2025, 6, 3, 4, 30, 0).unwrap();
        let snap = stats.snapshot(after_local_midnight);
        assert_eq!(snap.messages, 0);
    }

    #[test]
    fn reset_clears_mid_day() {
        let stats = stats();
        let now = morning();
        stats.record_message(now);
        stats.record_voice_join(now);
        stats.reset(now);

        let snap = stats.snapshot(now);
        assert_eq!(snap.messages, 0);
        assert_eq!(snap.voice_joins, 0);
        assert!(snap.peak_hour.is_none());
    }
}
