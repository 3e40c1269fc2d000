//! Axum-based HTTP relay serving the cached snapshots

use crate::relay::Relay;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Content type of the Prometheus text format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

// Snapshots are serialized after the read lock is released
fn json_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn power_flow(State(state): State<AppState>) -> Response {
    let snapshot = state.relay.power_flow().await;
    json_response(&*snapshot)
}

pub async fn flow(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.flow_view().await)
}

pub async fn overview(State(state): State<AppState>) -> Response {
    let snapshot = state.relay.overview().await;
    json_response(&*snapshot)
}

pub async fn details(State(state): State<AppState>) -> Response {
    let snapshot = state.relay.details().await;
    json_response(&*snapshot)
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.relay.metrics().render() {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let phase = state.relay.phase().await;
    Json(serde_json::json!({ "status": "ok", "phase": phase }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/powerflow", get(power_flow))
        .route("/flow", get(flow))
        .route("/overview", get(overview))
        .route("/details", get(details))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `listen` (`host:port`) and serve until the process exits
pub async fn serve(relay: Arc<Relay>, listen: &str) -> anyhow::Result<()> {
    let router = build_router(AppState { relay });

    let logger = crate::logging::get_logger("web");
    logger.info(&format!("Binding relay to {listen}"));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Relay listening at http://{local_addr} (/powerflow, /flow, /overview, /details, /metrics, /health)"
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
