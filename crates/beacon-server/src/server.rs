use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use beacon_compose::ActivityStats;
use beacon_core::clock::Clock;
use beacon_limits::AdmissionGate;
use beacon_notify::GatewaySink;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Which collaborators have credentials. Static for the process lifetime.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ServicesStatus {
    pub chat: bool,
    pub gateway: bool,
    pub generation: bool,
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub gateway: Arc<GatewaySink>,
    pub stats: Arc<ActivityStats>,
    pub clock: Arc<dyn Clock>,
    pub services: ServicesStatus,
    pub started_at: Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the status server. Returns a handle holding the bound
/// port; binding port 0 picks a free one.
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "status server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
    })
}

/// Handle returned by `start()`. Keeps the serve task alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "presence beacon running",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "timestamp": state.clock.now().to_rfc3339(),
    }))
}

async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.clock.now();
    Json(serde_json::json!({
        "activity": state.stats.snapshot(now),
        "admission": state.gate.snapshot(now),
        "gateway_rate_limit": state.gateway.rate_status(),
        "services": state.services,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::clock::ManualClock;
    use beacon_core::settings::GatewaySettings;
    use beacon_limits::GateConfig;
    use chrono::{TimeZone, Utc};

    fn test_state() -> AppState {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap(),
        ));
        let now = clock.now();
        AppState {
            gate: Arc::new(AdmissionGate::new(GateConfig::default(), now)),
            gateway: Arc::new(GatewaySink::new(&GatewaySettings::default(), clock.clone())),
            stats: Arc::new(ActivityStats::new(chrono_tz::America::New_York)),
            clock,
            services: ServicesStatus {
                chat: false,
                gateway: false,
                generation: true,
            },
            started_at: Instant::now(),
        }
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let config = ServerConfig { port: 0 };
        let handle = start(config, test_state()).await.unwrap();
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn stats_endpoint_reports_all_sections() {
        let state = test_state();
        state.stats.record_voice_join(state.clock.now());
        let handle = start(ServerConfig { port: 0 }, state).await.unwrap();

        let url = format!("http://127.0.0.1:{}/stats", handle.port);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();

        assert_eq!(body["activity"]["voice_joins"], 1);
        assert_eq!(body["admission"]["daily_limit"], 500);
        assert_eq!(body["gateway_rate_limit"]["hourly_limit"], 50);
        assert_eq!(body["services"]["generation"], true);
        assert_eq!(body["services"]["chat"], false);
    }

    #[tokio::test]
    async fn root_reports_uptime() {
        let handle = start(ServerConfig { port: 0 }, test_state()).await.unwrap();
        let url = format!("http://127.0.0.1:{}/", handle.port);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "presence beacon running");
        assert!(body["uptime_seconds"].is_u64());
    }
}
