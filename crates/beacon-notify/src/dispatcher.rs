use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use beacon_core::events::PresenceEvent;

use crate::sink::{DeliveryOutcome, DeliveryStatus, DestinationSink};
use crate::template;

/// One sink paired with the message template rendered for it.
pub struct Destination {
    pub sink: Arc<dyn DestinationSink>,
    pub template: String,
}

/// Fans one admitted presence event out to every destination concurrently.
///
/// Destinations are isolated from each other: a failure or missing
/// configuration at one never affects delivery to the rest, and every
/// destination gets an outcome entry either way.
pub struct NotificationDispatcher {
    destinations: Vec<Destination>,
}

impl NotificationDispatcher {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub async fn fan_out(&self, event: &PresenceEvent) -> Vec<DeliveryOutcome> {
        let sends = self.destinations.iter().map(|dest| async {
            let name = dest.sink.name().to_string();
            if !dest.sink.is_configured() {
                return DeliveryOutcome {
                    destination: name,
                    status: DeliveryStatus::Skipped,
                };
            }

            let text = template::render(&dest.template, event);
            match dest.sink.send(&text).await {
                Ok(message_id) => {
                    info!(
                        destination = %name,
                        subject = %event.subject_id,
                        "notification delivered"
                    );
                    DeliveryOutcome {
                        destination: name,
                        status: DeliveryStatus::Sent { message_id },
                    }
                }
                Err(err) => {
                    warn!(
                        destination = %name,
                        subject = %event.subject_id,
                        error = %err,
                        "notification delivery failed"
                    );
                    DeliveryOutcome {
                        destination: name,
                        status: DeliveryStatus::Failed {
                            error: err.to_string(),
                        },
                    }
                }
            }
        });

        join_all(sends).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use beacon_core::events::ChannelContext;
    use chrono::Utc;
    use parking_lot::Mutex;

    struct MockSink {
        name: &'static str,
        configured: bool,
        result: Result<Option<String>, SinkError>,
        sent: Mutex<Vec<String>>,
    }

    impl MockSink {
        fn ok(name: &'static str) -> Self {
            Self {
                name,
                configured: true,
                result: Ok(Some("m-1".into())),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                result: Err(SinkError::Http {
                    status: 500,
                    body: "boom".into(),
                }),
                ..Self::ok(name)
            }
        }

        fn unconfigured(name: &'static str) -> Self {
            Self {
                configured: false,
                ..Self::ok(name)
            }
        }
    }

    #[async_trait]
    impl DestinationSink for MockSink {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send(&self, text: &str) -> Result<Option<String>, SinkError> {
            self.sent.lock().push(text.to_string());
            self.result.clone()
        }
    }

    fn event() -> PresenceEvent {
        PresenceEvent::new(
            "u1",
            "Dana",
            Utc::now(),
            ChannelContext {
                id: "c1".into(),
                name: "Lounge".into(),
            },
        )
    }

    fn destination(sink: Arc<MockSink>, template: &str) -> Destination {
        Destination {
            sink,
            template: template.into(),
        }
    }

    #[tokio::test]
    async fn renders_per_destination_template() {
        let chat = Arc::new(MockSink::ok("chat"));
        let gateway = Arc::new(MockSink::ok("gateway"));
        let dispatcher = NotificationDispatcher::new(vec![
            destination(chat.clone(), "chat: {displayName} in {channelName}"),
            destination(gateway.clone(), "gw: {displayName}"),
        ]);

        let outcomes = dispatcher.fan_out(&event()).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(DeliveryOutcome::is_sent));
        assert_eq!(chat.sent.lock()[0], "chat: Dana in Lounge");
        assert_eq!(gateway.sent.lock()[0], "gw: Dana");
    }

    #[tokio::test]
    async fn one_failure_does_not_block_the_rest() {
        let broken = Arc::new(MockSink::failing("chat"));
        let healthy = Arc::new(MockSink::ok("gateway"));
        let dispatcher = NotificationDispatcher::new(vec![
            destination(broken, "{displayName}"),
            destination(healthy.clone(), "{displayName}"),
        ]);

        let outcomes = dispatcher.fan_out(&event()).await;
        assert!(matches!(outcomes[0].status, DeliveryStatus::Failed { .. }));
        assert!(outcomes[1].is_sent());
        assert_eq!(healthy.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_destination_is_skipped_without_send() {
        let missing = Arc::new(MockSink::unconfigured("gateway"));
        let dispatcher =
            NotificationDispatcher::new(vec![destination(missing.clone(), "{displayName}")]);

        let outcomes = dispatcher.fan_out(&event()).await;
        assert!(matches!(outcomes[0].status, DeliveryStatus::Skipped));
        assert!(missing.sent.lock().is_empty());
    }
}
