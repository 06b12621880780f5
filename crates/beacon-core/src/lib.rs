//! Shared types for the beacon service: presence events, the injectable
//! clock, and process settings.

pub mod clock;
pub mod events;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{ChannelContext, PresenceEvent};
pub use settings::BeaconSettings;
