use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use beacon_core::settings::LimitSettings;

use crate::daily::DailyCounter;
use crate::window::SlidingWindowCounter;

/// Why an event was denied. Ordered by tier precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Cooldown,
    HourlyLimit,
    BurstLimit,
    DailyLimit,
}

impl DenyReason {
    /// Short classification string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooldown => "cooldown",
            Self::HourlyLimit => "hourly_limit",
            Self::BurstLimit => "burst_limit",
            Self::DailyLimit => "daily_limit",
        }
    }
}

/// Outcome of one admission decision. Produced fresh per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allowed,
    Denied(DenyReason),
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allowed => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}

/// Static tier configuration. Fixed for the process lifetime.
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub cooldown: Duration,
    pub burst_limit: u32,
    pub burst_window: Duration,
    pub daily_limit: u32,
    pub user_hourly_limit: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::from(&LimitSettings::default())
    }
}

impl From<&LimitSettings> for GateConfig {
    fn from(s: &LimitSettings) -> Self {
        Self {
            cooldown: Duration::seconds(s.cooldown_seconds as i64),
            burst_limit: s.burst_limit,
            burst_window: Duration::minutes(s.burst_window_minutes as i64),
            daily_limit: s.daily_limit,
            user_hourly_limit: s.user_hourly_limit,
        }
    }
}

/// All mutable gate state, guarded by one mutex so the whole
/// check-then-record sequence is atomic. Two concurrent events for the same
/// subject can never both observe "no prior join".
struct GateState {
    burst: SlidingWindowCounter,
    daily: DailyCounter,
    hourly: HashMap<String, SlidingWindowCounter>,
    /// Last allowed instant per subject. Entries expire lazily by comparison
    /// against `now - cooldown`; stale ones are swept during `snapshot`.
    cooldowns: HashMap<String, DateTime<Utc>>,
}

/// Layered admission gate for presence notifications.
///
/// Tiers are evaluated in fixed precedence (cooldown, per-user hourly,
/// global burst, global daily) and the first failing tier is the reported
/// reason. Counters are only touched when all four tiers pass: a denied
/// event leaves no trace.
pub struct AdmissionGate {
    config: GateConfig,
    state: Mutex<GateState>,
}

impl AdmissionGate {
    pub fn new(config: GateConfig, now: DateTime<Utc>) -> Self {
        let state = GateState {
            burst: SlidingWindowCounter::new(config.burst_window),
            daily: DailyCounter::new(now),
            hourly: HashMap::new(),
            cooldowns: HashMap::new(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Decide whether the event for `subject_id` at `now` may produce a
    /// notification, recording it in every tier on acceptance.
    pub fn decide(&self, subject_id: &str, now: DateTime<Utc>) -> AdmissionDecision {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(last) = state.cooldowns.get(subject_id) {
            if now.signed_duration_since(*last) < self.config.cooldown {
                tracing::debug!(subject_id, "ignoring rapid rejoin");
                return AdmissionDecision::Denied(DenyReason::Cooldown);
            }
        }

        let hourly = state
            .hourly
            .entry(subject_id.to_string())
            .or_insert_with(|| SlidingWindowCounter::new(Duration::hours(1)));
        if hourly.count(now) as u32 >= self.config.user_hourly_limit {
            tracing::warn!(
                subject_id,
                limit = self.config.user_hourly_limit,
                "user exceeded hourly notification limit"
            );
            return AdmissionDecision::Denied(DenyReason::HourlyLimit);
        }

        if state.burst.count(now) as u32 >= self.config.burst_limit {
            tracing::warn!(
                limit = self.config.burst_limit,
                window_minutes = self.config.burst_window.num_minutes(),
                "burst limit exceeded"
            );
            return AdmissionDecision::Denied(DenyReason::BurstLimit);
        }

        if state.daily.count(now) >= self.config.daily_limit {
            tracing::warn!(
                limit = self.config.daily_limit,
                "daily notification limit exceeded"
            );
            return AdmissionDecision::Denied(DenyReason::DailyLimit);
        }

        hourly.record(now);
        state.burst.record(now);
        state.cooldowns.insert(subject_id.to_string(), now);
        state.daily.increment();

        AdmissionDecision::Allowed
    }

    /// Read-only view of current counter values for the status endpoint.
    /// Also sweeps expired cooldown entries and empty hourly counters.
    pub fn snapshot(&self, now: DateTime<Utc>) -> GateSnapshot {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state
            .cooldowns
            .retain(|_, last| now.signed_duration_since(*last) < self.config.cooldown);

        let mut user_hourly_counts = BTreeMap::new();
        state.hourly.retain(|subject_id, counter| {
            let count = counter.count(now);
            if count > 0 {
                user_hourly_counts.insert(subject_id.clone(), count as u32);
                true
            } else {
                false
            }
        });

        GateSnapshot {
            burst_count: state.burst.count(now) as u32,
            burst_limit: self.config.burst_limit,
            daily_count: state.daily.count(now),
            daily_limit: self.config.daily_limit,
            cooldown_seconds: self.config.cooldown.num_seconds(),
            user_hourly_limit: self.config.user_hourly_limit,
            user_hourly_counts,
        }
    }
}

/// Counter values at one instant, serialized by `/stats`.
#[derive(Clone, Debug, Serialize)]
pub struct GateSnapshot {
    pub burst_count: u32,
    pub burst_limit: u32,
    pub daily_count: u32,
    pub daily_limit: u32,
    pub cooldown_seconds: i64,
    pub user_hourly_limit: u32,
    pub user_hourly_counts: BTreeMap<String, u32>,
}
