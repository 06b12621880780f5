use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Failure modes shared by all destinations.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("destination is not configured")]
    NotConfigured,

    #[error("destination hourly limit reached")]
    RateLimited,

    #[error("destination returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("destination returned an unreadable response")]
    BadResponse,
}

impl SinkError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => SinkError::RateLimited,
            _ => SinkError::Http { status, body },
        }
    }
}

/// What happened to one rendered message at one destination.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Delivered. The platform message id is kept when the destination
    /// returns one, so callers can probe the message later.
    Sent {
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
    /// Destination has no credentials; nothing was attempted.
    Skipped,
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub destination: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self.status, DeliveryStatus::Sent { .. })
    }
}

/// One outbound messaging destination.
#[async_trait]
pub trait DestinationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the destination has everything it needs to deliver.
    /// Unconfigured destinations are skipped, never errors.
    fn is_configured(&self) -> bool;

    /// Deliver one already-rendered message. Returns the platform message id
    /// when the destination reports one.
    async fn send(&self, text: &str) -> Result<Option<String>, SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_maps_to_rate_limited() {
        assert!(matches!(
            SinkError::from_status(429, String::new()),
            SinkError::RateLimited
        ));
        assert!(matches!(
            SinkError::from_status(503, "busy".into()),
            SinkError::Http { status: 503, .. }
        ));
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = DeliveryOutcome {
            destination: "chat".into(),
            status: DeliveryStatus::Sent {
                message_id: Some("42".into()),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["destination"], "chat");
        assert_eq!(json["status"], "sent");
        assert_eq!(json["message_id"], "42");
    }
}
