use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc;

use beacon_compose::{ActivityStats, DailyTrigger, PostComposer};
use beacon_core::clock::{Clock, SystemClock};
use beacon_core::events::PresenceEvent;
use beacon_core::settings::BeaconSettings;
use beacon_limits::{AdmissionGate, GateConfig};
use beacon_notify::{ChatSink, Destination, DestinationSink, GatewaySink, NotificationDispatcher};
use beacon_server::{AppState, ServerConfig, ServicesStatus};
use beacon_telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    beacon_telemetry::init_telemetry(&TelemetryConfig::from_env());
    tracing::info!("starting presence beacon");

    let settings = BeaconSettings::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let started_at = Instant::now();

    let gate = Arc::new(AdmissionGate::new(
        GateConfig::from(&settings.limits),
        clock.now(),
    ));

    let provider = beacon_llm::provider_from_settings(&settings.generation);
    tracing::info!(
        provider = provider.name(),
        configured = provider.is_configured(),
        "generation provider selected"
    );

    let notify_sink = Arc::new(ChatSink::new(
        settings.chat.bot_token.clone(),
        settings.chat.notify_channel_id.clone(),
    ));
    let post_sink = Arc::new(ChatSink::new(
        settings.chat.bot_token.clone(),
        settings.chat.post_channel_id.clone(),
    ));
    let gateway = Arc::new(GatewaySink::new(&settings.gateway, clock.clone()));

    let chat_configured = notify_sink.is_configured();
    let gateway_configured = gateway.is_configured();

    let dispatcher = Arc::new(NotificationDispatcher::new(vec![
        Destination {
            sink: notify_sink,
            template: settings.chat.template.clone(),
        },
        Destination {
            sink: gateway.clone(),
            template: settings.gateway.template.clone(),
        },
    ]));

    let stats = Arc::new(ActivityStats::new(settings.post.timezone));

    let composer = Arc::new(PostComposer::new(
        provider.clone(),
        post_sink,
        stats.clone(),
        clock.clone(),
        &settings.post,
    ));
    let trigger = DailyTrigger::new(settings.post.post_time, settings.post.timezone);
    tokio::spawn(beacon_compose::schedule::run_daily(trigger, composer));

    // The platform connection feeds presence events into this channel; it is
    // the narrow seam between the platform client and the pipeline.
    let (presence_tx, presence_rx) = mpsc::channel::<PresenceEvent>(256);
    tokio::spawn(presence_loop(
        presence_rx,
        gate.clone(),
        dispatcher,
        stats.clone(),
    ));
    let _presence_tx = presence_tx;

    let server_state = AppState {
        gate,
        gateway,
        stats,
        clock,
        services: ServicesStatus {
            chat: chat_configured,
            gateway: gateway_configured,
            generation: provider.is_configured(),
        },
        started_at,
    };
    let handle = beacon_server::start(
        ServerConfig {
            port: settings.server.port,
        },
        server_state,
    )
    .await
    .context("failed to start status server")?;
    tracing::info!(port = handle.port, "presence beacon ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    tracing::info!("shutting down");
    Ok(())
}

/// Consume presence events: count them, run admission, and fan out
/// notifications for admitted events. Each admitted event's fan-out runs on
/// its own task so a slow destination never delays admission of the next
/// event.
async fn presence_loop(
    mut rx: mpsc::Receiver<PresenceEvent>,
    gate: Arc<AdmissionGate>,
    dispatcher: Arc<NotificationDispatcher>,
    stats: Arc<ActivityStats>,
) {
    while let Some(event) = rx.recv().await {
        stats.record_voice_join(event.timestamp);

        let decision = gate.decide(&event.subject_id, event.timestamp);
        match decision.deny_reason() {
            None => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.fan_out(&event).await;
                });
            }
            Some(reason) => {
                tracing::debug!(
                    subject = %event.subject_id,
                    reason = reason.as_str(),
                    "presence event denied"
                );
            }
        }
    }
}
