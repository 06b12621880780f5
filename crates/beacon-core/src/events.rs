use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The voice channel a presence transition happened in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelContext {
    pub id: String,
    pub name: String,
}

/// A user joining a voice channel. Created by the platform gateway on each
/// presence transition, consumed immediately, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// Platform user id, the subject of all per-user rate limiting.
    pub subject_id: String,
    /// Display name substituted into notification templates.
    pub display_name: String,
    pub timestamp: DateTime<Utc>,
    pub channel: ChannelContext,
}

impl PresenceEvent {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        channel: ChannelContext,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            timestamp,
            channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serde_roundtrip() {
        let event = PresenceEvent::new(
            "user-1",
            "Alice",
            Utc::now(),
            ChannelContext {
                id: "chan-9".into(),
                name: "General".into(),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: PresenceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.subject_id, "user-1");
        assert_eq!(parsed.channel.name, "General");
    }
}
