use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::info;

use crate::composer::{PostComposer, RunKind};

/// Fires once per local calendar day at a fixed wall-clock time.
///
/// The next fire instant is recomputed from the configured timezone after
/// every tick, so DST transitions shift the UTC instant rather than the
/// local posting time. A post time falling inside a spring-forward gap
/// slides one hour later that day.
#[derive(Clone, Debug)]
pub struct DailyTrigger {
    post_time: NaiveTime,
    timezone: Tz,
}

impl DailyTrigger {
    pub fn new(post_time: NaiveTime, timezone: Tz) -> Self {
        Self {
            post_time,
            timezone,
        }
    }

    /// First instant strictly after `now` when the trigger fires.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_today = now.with_timezone(&self.timezone).date_naive();
        for day_offset in 0..=2 {
            if let Some(at) = self.fire_instant_on(local_today + Duration::days(day_offset)) {
                if at > now {
                    return at;
                }
            }
        }
        // Unreachable with a sane timezone; keeps the loop honest.
        now + Duration::days(1)
    }

    fn fire_instant_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let naive = date.and_time(self.post_time);
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(at) => Some(at.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => match self.timezone.from_local_datetime(&(naive + Duration::hours(1))) {
                LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => {
                    Some(at.with_timezone(&Utc))
                }
                LocalResult::None => None,
            },
        }
    }
}

/// Sleep until each daily fire time and run the composer. Runs until the
/// process shuts down.
pub async fn run_daily(trigger: DailyTrigger, composer: Arc<PostComposer>) {
    loop {
        let now = Utc::now();
        let next = trigger.next_fire(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "next scheduled post");
        tokio::time::sleep(wait).await;
        composer.run(RunKind::Scheduled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn trigger() -> DailyTrigger {
        DailyTrigger::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            chrono_tz::America::New_York,
        )
    }

    #[test]
    fn before_post_time_fires_same_day() {
        // 06:00 local on June 2nd.
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let next = trigger().next_fire(now);
        // 09:00 EDT is 13:00 UTC.
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap());
    }

    #[test]
    fn after_post_time_fires_next_day() {
        // 10:30 local on June 2nd.
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0).unwrap();
        let next = trigger().next_fire(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 3, 13, 0, 0).unwrap());
    }

    #[test]
    fn exactly_at_post_time_fires_next_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap();
        let next = trigger().next_fire(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 3, 13, 0, 0).unwrap());
    }

    #[test]
    fn local_time_is_stable_across_dst() {
        // March 8th 2025, the night before the US spring-forward.
        let before = Utc.with_ymd_and_hms(2025, 3, 8, 20, 0, 0).unwrap();
        let next = trigger().next_fire(before);
        // 09:00 EDT on March 9th is 13:00 UTC (EST would have been 14:00).
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 9, 13, 0, 0).unwrap());
        assert_eq!(
            next.with_timezone(&chrono_tz::America::New_York).hour(),
            9
        );
    }

    #[test]
    fn post_time_in_dst_gap_slides_one_hour() {
        // 02:30 does not exist on March 9th 2025 in New York.
        let gap_trigger = DailyTrigger::new(
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            chrono_tz::America::New_York,
        );
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 5, 0, 0).unwrap();
        let next = gap_trigger.next_fire(before);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 9, 7, 30, 0).unwrap());
    }
}
