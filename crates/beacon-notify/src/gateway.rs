use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use beacon_core::clock::Clock;
use beacon_core::settings::GatewaySettings;

use crate::sink::{DestinationSink, SinkError};

const DEFAULT_BASE_URL: &str = "https://api.green-api.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Messaging-gateway destination (hosted group-messaging API).
///
/// Carries its own outbound hourly cap, separate from the admission gate:
/// the gateway meters what this process actually hands to the hosted API,
/// regardless of which tier admitted the event. The cap is a fixed clock-hour
/// window that resets on the hour.
pub struct GatewaySink {
    client: Client,
    instance_id: Option<String>,
    api_token: Option<SecretString>,
    group_id: Option<String>,
    hourly_limit: u32,
    base_url: String,
    clock: Arc<dyn Clock>,
    window: Mutex<HourWindow>,
}

#[derive(Debug, Clone, Copy)]
struct HourWindow {
    hour_start: DateTime<Utc>,
    sent: u32,
}

/// Snapshot of the gateway's self-limit, reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRateStatus {
    pub sent_this_hour: u32,
    pub hourly_limit: u32,
    pub remaining: u32,
}

impl GatewaySink {
    pub fn new(settings: &GatewaySettings, clock: Arc<dyn Clock>) -> Self {
        Self::with_base_url(settings, clock, DEFAULT_BASE_URL)
    }

    /// Override the API origin. Used by tests to point at a local mock server.
    pub fn with_base_url(
        settings: &GatewaySettings,
        clock: Arc<dyn Clock>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        let hour_start = truncate_to_hour(clock.now());
        Self {
            client,
            instance_id: settings.instance_id.clone(),
            api_token: settings.api_token.clone(),
            group_id: settings.group_id.clone(),
            hourly_limit: settings.hourly_limit,
            base_url: base_url.into(),
            clock,
            window: Mutex::new(HourWindow {
                hour_start,
                sent: 0,
            }),
        }
    }

    /// Reserve one send slot in the current clock hour, rolling the window
    /// first if the hour has changed.
    fn try_reserve_slot(&self) -> Result<(), SinkError> {
        let now = self.clock.now();
        let hour_start = truncate_to_hour(now);
        let mut window = self.window.lock();
        if window.hour_start != hour_start {
            window.hour_start = hour_start;
            window.sent = 0;
        }
        if window.sent >= self.hourly_limit {
            return Err(SinkError::RateLimited);
        }
        window.sent += 1;
        Ok(())
    }

    /// Return a reserved slot after a failed send, so only deliveries the
    /// API accepted count against the cap. No-op if the hour has rolled.
    fn release_slot(&self) {
        let hour_start = truncate_to_hour(self.clock.now());
        let mut window = self.window.lock();
        if window.hour_start == hour_start && window.sent > 0 {
            window.sent -= 1;
        }
    }

    async fn deliver(
        &self,
        instance: &str,
        token: &SecretString,
        group: &str,
        text: &str,
    ) -> Result<Option<String>, SinkError> {
        let resp = self
            .client
            .post(format!(
                "{}/waInstance{}/sendMessage/{}",
                self.base_url,
                instance,
                token.expose_secret()
            ))
            .json(&json!({ "chatId": group, "message": text }))
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::from_status(status, body));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        Ok(value
            .get("idMessage")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    pub fn rate_status(&self) -> GatewayRateStatus {
        let hour_start = truncate_to_hour(self.clock.now());
        let window = self.window.lock();
        let sent = if window.hour_start == hour_start {
            window.sent
        } else {
            0
        };
        GatewayRateStatus {
            sent_this_hour: sent,
            hourly_limit: self.hourly_limit,
            remaining: self.hourly_limit.saturating_sub(sent),
        }
    }

    fn credentials(&self) -> Result<(&str, &SecretString, &str), SinkError> {
        match (&self.instance_id, &self.api_token, &self.group_id) {
            (Some(instance), Some(token), Some(group)) => Ok((instance, token, group)),
            _ => Err(SinkError::NotConfigured),
        }
    }
}

fn truncate_to_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

#[async_trait]
impl DestinationSink for GatewaySink {
    fn name(&self) -> &str {
        "gateway"
    }

    fn is_configured(&self) -> bool {
        self.instance_id.is_some() && self.api_token.is_some() && self.group_id.is_some()
    }

    #[instrument(skip(self, text))]
    async fn send(&self, text: &str) -> Result<Option<String>, SinkError> {
        let (instance, token, group) = self.credentials()?;
        self.try_reserve_slot()?;

        let result = self.deliver(instance, token, group, text).await;
        if result.is_err() {
            self.release_slot();
        }
        result
    }
}
