//! Scheduled post composition: budgeting generated text under the platform
//! ceiling, orchestrating one post run, firing the daily trigger, and keeping
//! the activity counters the status endpoint reports.

pub mod budget;
pub mod composer;
pub mod schedule;
pub mod stats;

pub use budget::{BudgetResult, ContentBudgeter};
pub use composer::{PostChannel, PostComposer, RunKind, RunOutcome};
pub use schedule::DailyTrigger;
pub use stats::{ActivityStats, StatsSnapshot};
