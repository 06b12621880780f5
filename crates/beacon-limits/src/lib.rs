//! Multi-tier admission control for presence notifications.
//!
//! Four tiers evaluated in fixed precedence: per-user cooldown, per-user
//! hourly cap, global burst cap, global daily cap. All state is in-memory
//! and resets on process restart by design.

mod daily;
mod gate;
mod window;

pub use daily::DailyCounter;
pub use gate::{AdmissionDecision, AdmissionGate, DenyReason, GateConfig, GateSnapshot};
pub use window::SlidingWindowCounter;
