use std::collections::BTreeMap;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::client::DingTalkClient;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub client: DingTalkClient,
}

impl AppState {
    pub fn new(metrics: &Metrics, client: DingTalkClient) -> Self {
        Self { metrics_state: MetricsState::new(metrics.registry.clone()), client }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsConfigQuery {
    pub nonce: String,
    pub timestamp: String,
    pub url: String,
}

pub fn router(state: AppState, settings_config: &SettingsConfig) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/jsapi/config", get(jsapi_config))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Serve the handshake / metrics endpoints until SIGINT or SIGTERM.
pub async fn start(settings_config: &SettingsConfig, client: DingTalkClient) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(AppState::new(metrics, client), settings_config);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    metrics.up.set(0);
    info!("server stopped");
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn jsapi_config(State(state): State<AppState>, Query(query): Query<JsConfigQuery>) -> Response {
    match state.client.get_config(&query.nonce, &query.timestamp, &query.url).await {
        Ok(config) => Json::<BTreeMap<String, String>>(config).into_response(),
        Err(err) => {
            error!("jsapi config failed: {}", err);
            (StatusCode::BAD_GATEWAY, Json(json!({"error": err.to_string()}))).into_response()
        }
    }
}

async fn shutdown_signal() {
    let (mut sigint, mut sigterm) = match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        _ => {
            error!("failed to install signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT. Initiating graceful shutdown..."),
        _ = sigterm.recv() => info!("Received SIGTERM. Initiating graceful shutdown..."),
    }
}
