use chrono::{DateTime, Duration, Utc};

/// Calendar-day notification counter with a lazy midnight rollover.
///
/// There is no reset timer: the counter rolls forward whenever a read finds
/// that more than a full day has passed since the last midnight boundary.
#[derive(Clone, Debug)]
pub struct DailyCounter {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl DailyCounter {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            reset_at: midnight_of(now),
        }
    }

    /// Roll past any elapsed midnight boundaries, then return today's count.
    pub fn count(&mut self, now: DateTime<Utc>) -> u32 {
        if now > self.reset_at + Duration::days(1) {
            self.count = 0;
            self.reset_at = midnight_of(now);
        }
        self.count
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }
}

fn midnight_of(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
}
