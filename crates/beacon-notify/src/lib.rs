//! Outbound notification destinations and fan-out.
//!
//! Each destination implements [`DestinationSink`]; the
//! [`NotificationDispatcher`] renders a per-destination template and sends to
//! every destination concurrently, isolating failures so one broken
//! destination never blocks another.

pub mod chat;
pub mod dispatcher;
pub mod gateway;
pub mod sink;
pub mod template;

pub use chat::ChatSink;
pub use dispatcher::{Destination, NotificationDispatcher};
pub use gateway::{GatewayRateStatus, GatewaySink};
pub use sink::{DeliveryOutcome, DeliveryStatus, DestinationSink, SinkError};
